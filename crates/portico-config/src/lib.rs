//! Typed configuration for Portico servers.
//!
//! Configuration is layered: defaults, then a TOML or JSON file, then
//! `PREFIX__SECTION__KEY` environment variables (optionally seeded from a
//! `.env` file). Files are strict: unknown fields are errors.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! shutdown_timeout_secs = 30
//! engine = "express"   # or "hapi"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"      # or "pretty", "compact"
//! span_events = false
//! ```
//!
//! # Example
//!
//! ```no_run
//! use portico_config::ConfigLoader;
//! use portico_telemetry::init_logging;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("portico.toml")?
//!     .with_env_prefix("PORTICO")
//!     .load()?;
//!
//! init_logging(&config.log_config()?)?;
//! let server_config = config.server_config();
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/portico-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::PorticoConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{EngineKind, LoggingSettings, ServerSettings};
