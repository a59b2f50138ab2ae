//! Configuration schema types.
//!
//! Each section maps one-to-one onto a table of the configuration file.

use std::fmt;
use std::str::FromStr;

use portico_server::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};

/// Which engine adapter serves the routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Continuation-style engine with catch-all support.
    #[default]
    Express,
    /// Return-value engine with brace-syntax paths.
    Hapi,
}

impl EngineKind {
    /// Returns the name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Express => "express",
            Self::Hapi => "hapi",
        }
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "express" => Ok(Self::Express),
            "hapi" => Ok(Self::Hapi),
            other => Err(format!("expected 'express' or 'hapi', got '{other}'")),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `[server]` section.
///
/// # Example
///
/// ```
/// use portico_config::{EngineKind, ServerSettings};
///
/// let settings = ServerSettings {
///     host: "0.0.0.0".to_string(),
///     port: 8080,
///     ..Default::default()
/// };
/// assert_eq!(settings.engine, EngineKind::Express);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// Host name or IP address to listen on.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port; `0` asks the OS for a free port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Engine adapter.
    #[serde(default)]
    pub engine: EngineKind,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            engine: EngineKind::default(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_shutdown_timeout() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

/// The `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Whether logging is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g. "info", "portico_server=debug,info").
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format: "json", "pretty" or "compact".
    #[serde(default = "default_format")]
    pub format: String,

    /// Whether to log span creation and close.
    #[serde(default)]
    pub span_events: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: default_format(),
            span_events: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.shutdown_timeout_secs, 30);
        assert_eq!(settings.engine, EngineKind::Express);
    }

    #[test]
    fn test_engine_kind_parsing() {
        assert_eq!("Hapi".parse::<EngineKind>(), Ok(EngineKind::Hapi));
        assert_eq!("express".parse::<EngineKind>(), Ok(EngineKind::Express));
        assert!("koa".parse::<EngineKind>().is_err());
        assert_eq!(EngineKind::Hapi.to_string(), "hapi");
    }

    #[test]
    fn test_engine_kind_serde() {
        let settings: ServerSettings = toml::from_str(r#"engine = "hapi""#).unwrap();
        assert_eq!(settings.engine, EngineKind::Hapi);
        assert_eq!(settings.port, 3000);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ServerSettings, _> = toml::from_str("http_addr = \"0.0.0.0:80\"");
        assert!(result.is_err());
    }
}
