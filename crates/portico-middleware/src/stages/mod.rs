//! Built-in middleware stages.
//!
//! - [`debug_log`] - Log each request at `debug` level and continue

pub mod debug_log;

pub use debug_log::DebugLog;
