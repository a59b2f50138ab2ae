//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, files, `.env` and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, PorticoConfig};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file or string (TOML or JSON)
/// 3. Environment variables (`PREFIX__SECTION__KEY`)
///
/// # Example
///
/// ```no_run
/// use portico_config::ConfigLoader;
///
/// # fn main() -> Result<(), portico_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("portico.toml")?
///     .with_dotenv()?
///     .with_env_prefix("PORTICO")
///     .load()?;
///
/// println!("listening on {}", config.server_config().url());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: PorticoConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader that starts from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PorticoConfig::default(),
            env_prefix: None,
        }
    }

    /// Start from the development preset instead of the defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use portico_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = PorticoConfig::development();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`. Sections and
    /// fields missing from the file keep their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, has an
    /// unsupported extension, or does not parse.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.config = parse(&content, extension)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// `format` is `"toml"` or `"json"`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use portico_config::{ConfigLoader, EngineKind};
    ///
    /// let toml = r#"
    ///     [server]
    ///     port = 8080
    ///     engine = "hapi"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.port, 8080);
    /// assert_eq!(config.server.engine, EngineKind::Hapi);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Read environment variable overrides with the given prefix when
    /// [`load`](ConfigLoader::load) runs.
    ///
    /// With prefix `"PORTICO"`:
    /// - `PORTICO__SERVER__HOST=0.0.0.0`
    /// - `PORTICO__SERVER__PORT=8080`
    /// - `PORTICO__SERVER__SHUTDOWN_TIMEOUT_SECS=10`
    /// - `PORTICO__SERVER__ENGINE=hapi`
    /// - `PORTICO__LOGGING__LEVEL=debug`
    /// - `PORTICO__LOGGING__FORMAT=pretty`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory or its parents into
    /// the process environment. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but cannot be
    /// parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply environment overrides, validate, and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be parsed
    /// or validation fails.
    pub fn load(mut self) -> Result<PorticoConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> PorticoConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // Shares the prefix but is not ours, e.g. PORTICO_HOME.
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        match parts.as_slice() {
            ["SERVER", "HOST"] => {
                self.config.server.host = value.to_string();
            }
            ["SERVER", "PORT"] => {
                self.config.server.port = value
                    .parse()
                    .map_err(|_| ConfigError::env(key, "expected port number"))?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env(key, "expected integer"))?;
            }
            ["SERVER", "ENGINE"] => {
                self.config.server.engine = value
                    .parse()
                    .map_err(|reason: String| ConfigError::env(key, reason))?;
            }
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = value.to_lowercase();
            }
            ["LOGGING", "SPAN_EVENTS"] => {
                self.config.logging.span_events = parse_bool(value)
                    .ok_or_else(|| ConfigError::env(key, "expected boolean"))?;
            }
            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<PorticoConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
