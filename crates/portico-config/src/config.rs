//! The root configuration type.

use std::time::Duration;

use portico_server::ServerConfig;
use portico_telemetry::{create_env_filter, LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LoggingSettings, ServerSettings};

/// Complete Portico configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use portico_config::PorticoConfig;
///
/// let config = PorticoConfig::default();
/// assert_eq!(config.server_config().url(), "http://127.0.0.1:3000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PorticoConfig {
    /// Server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl PorticoConfig {
    /// Development preset: pretty logs at `debug`.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerSettings::default(),
            logging: LoggingSettings {
                level: "debug".to_string(),
                format: "pretty".to_string(),
                span_events: true,
                ..LoggingSettings::default()
            },
        }
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the host is empty, the log
    /// format is unknown or the log level is not a valid filter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::invalid_value("server.host", "must not be empty"));
        }

        self.log_format()?;

        if let Err(err) = create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", err.to_string()));
        }

        Ok(())
    }

    /// Converts the server section into the runtime configuration.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .host(self.server.host.clone())
            .port(self.server.port)
            .shutdown_timeout(Duration::from_secs(self.server.shutdown_timeout_secs))
            .build()
    }

    /// Converts the logging section into the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the format is unknown.
    pub fn log_config(&self) -> Result<LogConfig, ConfigError> {
        Ok(LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format: self.log_format()?,
            span_events: self.logging.span_events,
            ..LogConfig::production()
        })
    }

    fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.logging
            .format
            .parse()
            .map_err(|err: portico_telemetry::TelemetryError| {
                ConfigError::invalid_value("logging.format", err.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PorticoConfig::default().validate().is_ok());
        assert!(PorticoConfig::development().validate().is_ok());
    }

    #[test]
    fn test_server_config_conversion() {
        let mut config = PorticoConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 8080;
        config.server.shutdown_timeout_secs = 5;

        let server = config.server_config();
        assert_eq!(server.url(), "http://0.0.0.0:8080");
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_log_config_conversion() {
        let log = PorticoConfig::development().log_config().unwrap();
        assert_eq!(log.format, LogFormat::Pretty);
        assert_eq!(log.level, "debug");
        assert!(log.span_events);
    }

    #[test]
    fn test_empty_host_rejected() {
        let mut config = PorticoConfig::default();
        config.server.host = "  ".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.host"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut config = PorticoConfig::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "logging.format"
        ));
    }
}
