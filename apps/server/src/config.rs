//! Server configuration.
//!
//! Layered with the `config` crate, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `barbearia.toml` in the working directory (optional)
//! 3. `BARBEARIA_*` environment variables (`BARBEARIA_PORT=9000`)

use std::net::SocketAddr;
use std::path::PathBuf;

use barbearia_core::OversellPolicy;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;

const DATABASE_FILE: &str = "barbearia.db";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub max_connections: u32,
    /// What checkout does when a size bucket runs out.
    pub oversell_policy: OversellPolicy,
    /// Log WhatsApp messages instead of refusing them.
    pub whatsapp_enabled: bool,
    pub cors_permissive: bool,
}

/// Raw shape read from the sources before validation.
#[derive(Debug, Deserialize)]
struct RawConfig {
    host: String,
    port: i64,
    database_path: Option<String>,
    max_connections: i64,
    oversell_policy: String,
    whatsapp_enabled: bool,
    cors_permissive: bool,
}

impl AppConfig {
    /// Loads configuration from defaults, `barbearia.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("barbearia").required(false))
                .add_source(Environment::with_prefix("BARBEARIA").try_parsing(true)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let raw: RawConfig = builder
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("max_connections", 5)?
            .set_default("oversell_policy", "clamp")?
            .set_default("whatsapp_enabled", false)?
            .set_default("cors_permissive", true)?
            .build()?
            .try_deserialize()?;

        let port = u16::try_from(raw.port)
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| ConfigError::InvalidValue("port".to_string()))?;

        let max_connections = u32::try_from(raw.max_connections)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ConfigError::InvalidValue("max_connections".to_string()))?;

        let oversell_policy = raw
            .oversell_policy
            .parse()
            .map_err(|_| ConfigError::InvalidValue("oversell_policy".to_string()))?;

        let database_path = match raw.database_path.filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_database_path(),
        };

        Ok(AppConfig {
            host: raw.host,
            port,
            database_path,
            max_connections,
            oversell_policy,
            whatsapp_enabled: raw.whatsapp_enabled,
            cors_permissive: raw.cors_permissive,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("host".to_string()))
    }
}

/// `<data dir>/barbearia.db`, or the working directory when the platform
/// has no data dir.
fn default_database_path() -> PathBuf {
    ProjectDirs::from("br", "barbearia", "barbearia")
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_with(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        AppConfig::from_builder(builder)
    }

    #[test]
    fn test_defaults() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.oversell_policy, OversellPolicy::Clamp);
        assert!(!config.whatsapp_enabled);
        assert!(config.cors_permissive);
        assert!(config.database_path.ends_with(DATABASE_FILE));
    }

    #[test]
    fn test_overrides() {
        let config = load_with(&[
            ("port", "9000"),
            ("oversell_policy", "reject"),
            ("database_path", "/tmp/test.db"),
            ("whatsapp_enabled", "true"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.oversell_policy, OversellPolicy::Reject);
        assert_eq!(config.database_path, PathBuf::from("/tmp/test.db"));
        assert!(config.whatsapp_enabled);
        assert_eq!(config.bind_addr().unwrap().port(), 9000);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load_with(&[("oversell_policy", "maybe")]),
            Err(ConfigError::InvalidValue(key)) if key == "oversell_policy"
        ));
        assert!(matches!(
            load_with(&[("port", "70000")]),
            Err(ConfigError::InvalidValue(key)) if key == "port"
        ));
        assert!(matches!(
            load_with(&[("max_connections", "0")]),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
