//! Configuration error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration file does not exist.
    #[error("configuration file not found: {}", path.display())]
    Missing {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The file being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file extension or format name is not TOML or JSON.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// A TOML source did not parse or did not match the schema.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON source did not parse or did not match the schema.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A value parsed but is not acceptable.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `server.host`.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An environment override could not be parsed for its field.
    #[error("cannot parse environment variable {var}: {reason}")]
    Env {
        /// The variable name.
        var: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The `.env` file exists but could not be loaded.
    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl ConfigError {
    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_names_path() {
        let err = ConfigError::Missing {
            path: PathBuf::from("/etc/portico/portico.toml"),
        };
        assert_eq!(
            err.to_string(),
            "configuration file not found: /etc/portico/portico.toml"
        );
    }

    #[test]
    fn test_invalid_value() {
        let err = ConfigError::invalid_value("server.host", "must not be empty");
        assert_eq!(err.to_string(), "invalid value for server.host: must not be empty");
    }

    #[test]
    fn test_env_keeps_source_variable() {
        let err = ConfigError::env("PORTICO__SERVER__PORT", "expected port number");
        assert!(matches!(&err, ConfigError::Env { var, .. } if var == "PORTICO__SERVER__PORT"));
    }
}
