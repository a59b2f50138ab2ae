//! Logging setup for Portico services.
//!
//! Every Portico crate reports through `tracing` events with structured
//! fields (`engine`, `method`, `path`, `route`, `status`, `error`). This
//! crate installs a `tracing-subscriber` registry that writes those
//! events as JSON or human-readable lines.
//!
//! # Example
//!
//! ```rust,no_run
//! use portico_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production()).expect("logging already initialized");
//! ```

#![doc(html_root_url = "https://docs.rs/portico-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
