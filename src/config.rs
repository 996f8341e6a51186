//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Which event store backs the command service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStoreBackend {
    Memory,
    Postgres,
}

impl FromStr for EventStoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            _ => Err(ConfigError::InvalidValue("EVENT_STORE")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Event store backend
    pub event_store: EventStoreBackend,

    /// Database connection URL (required for the postgres backend)
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// How many times a command is reloaded and retried after a version conflict
    pub command_max_retries: u32,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let event_store = lookup("EVENT_STORE")
            .unwrap_or_else(|| "memory".to_string())
            .parse()?;

        let database_url = lookup("DATABASE_URL");
        if event_store == EventStoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let command_max_retries = lookup("COMMAND_MAX_RETRIES")
            .unwrap_or_else(|| "3".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("COMMAND_MAX_RETRIES"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        Ok(Self {
            event_store,
            database_url,
            database_max_connections,
            command_max_retries,
            environment,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.event_store, EventStoreBackend::Memory);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.command_max_retries, 3);
        assert!(!config.is_production());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let result = config(&[("EVENT_STORE", "postgres")]);
        assert!(matches!(result, Err(ConfigError::MissingEnv("DATABASE_URL"))));

        let config = config(&[
            ("EVENT_STORE", "Postgres"),
            ("DATABASE_URL", "postgres://localhost/schedule"),
            ("ENVIRONMENT", "production"),
        ])
        .unwrap();
        assert_eq!(config.event_store, EventStoreBackend::Postgres);
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("COMMAND_MAX_RETRIES", "many")]),
            Err(ConfigError::InvalidValue("COMMAND_MAX_RETRIES"))
        ));
        assert!(matches!(
            config(&[("EVENT_STORE", "redis")]),
            Err(ConfigError::InvalidValue("EVENT_STORE"))
        ));
    }
}
