use std::env;

use thiserror::Error;
use url::Url;

/// Configuration failures, raised before any connection is attempted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("DATABASE_URL is malformed: {0}")]
    MalformedDatabaseUrl(String),
}

/// Runtime configuration for the maintenance commands
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
}

impl Config {
    /// Build config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;
        Self::from_database_url(&url)
    }

    /// Build config from an explicit connection URI
    pub fn from_database_url(url: &str) -> Result<Self, ConfigError> {
        validate_database_url(url)?;
        Ok(Self {
            database_url: url.trim().to_string(),
        })
    }
}

/// Accepts `postgres://` / `postgresql://` URIs naming a host and a database.
fn validate_database_url(url: &str) -> Result<(), ConfigError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ConfigError::MissingDatabaseUrl);
    }

    let parsed =
        Url::parse(url).map_err(|e| ConfigError::MalformedDatabaseUrl(e.to_string()))?;

    let scheme = parsed.scheme();
    if scheme != "postgres" && scheme != "postgresql" {
        return Err(ConfigError::MalformedDatabaseUrl(format!(
            "unsupported scheme '{scheme}', expected postgres:// or postgresql://"
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::MalformedDatabaseUrl(
            "missing host".to_string(),
        ));
    }

    if parsed.path().trim_start_matches('/').is_empty() {
        return Err(ConfigError::MalformedDatabaseUrl(
            "missing database name".to_string(),
        ));
    }

    Ok(())
}
