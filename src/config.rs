//! Application configuration
//!
//! Loaded from a TOML file. Every section and field has a default, so an
//! empty file (or no file at all) yields a runnable configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infrastructure::DatabaseConfig;
use crate::shared::errors::InfraError;

/// Environment variable that points at the configuration file.
pub const CONFIG_ENV: &str = "SUBTRACK_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline applied to every lifecycle or aggregation call.
    pub request_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 5,
            shutdown_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `"text"` or `"json"`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Read and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        let config: AppConfig =
            toml::from_str(raw).map_err(|e| InfraError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, InfraError> {
        toml::to_string_pretty(self).map_err(|e| InfraError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        if self.server.port == 0 {
            return Err(InfraError::Config("server.port must be non-zero".into()));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(InfraError::Config(
                "server.request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(InfraError::Config("database.url must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(InfraError::Config(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(InfraError::Config(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }
        match self.logging.format.to_ascii_lowercase().as_str() {
            "text" | "json" => Ok(()),
            other => Err(InfraError::Config(format!(
                "logging.format must be \"text\" or \"json\", got \"{}\"",
                other
            ))),
        }
    }
}

/// `<config_dir>/subtrack/config.toml`, falling back to the working directory
/// when the platform has no config dir.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subtrack")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.auto_migrate);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9090

            [database]
            url = "postgres://user:secret@db/subs"
            max_connections = 20

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.address(), "0.0.0.0:9090");
        assert_eq!(config.server.shutdown_timeout_secs, 30);
        assert_eq!(config.database.url, "postgres://user:secret@db/subs");
        assert_eq!(config.database.min_connections, 1);
        assert!(config.logging.is_json());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let zero_timeout = "[server]\nrequest_timeout_secs = 0";
        assert!(matches!(
            AppConfig::from_toml(zero_timeout),
            Err(InfraError::Config(_))
        ));

        let pool = "[database]\nmax_connections = 2\nmin_connections = 5";
        assert!(matches!(AppConfig::from_toml(pool), Err(InfraError::Config(_))));

        let format = "[logging]\nformat = \"xml\"";
        assert!(matches!(AppConfig::from_toml(format), Err(InfraError::Config(_))));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            AppConfig::from_toml("[server\nport = 1"),
            Err(InfraError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = AppConfig::load(Path::new("/nonexistent/subtrack/config.toml"));
        assert!(matches!(result, Err(InfraError::Io(_))));
    }

    #[test]
    fn serialized_config_loads_back() {
        let mut config = AppConfig::default();
        config.server.port = 7000;
        let raw = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&raw).unwrap().server.port, 7000);
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with("subtrack/config.toml"));
    }
}
