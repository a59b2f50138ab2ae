//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed, or installing one failed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The level or filter directive could not be parsed.
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The log format name is not recognized.
    #[error("Unknown log format '{0}', expected one of: json, pretty, compact")]
    UnknownFormat(String),
}
