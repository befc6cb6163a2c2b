use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_path: String,
    /// Longest FXQL payload accepted, in characters.
    pub max_fxql_length: usize,
    /// Requests allowed per client within `rate_limit_window`.
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let host = env_map
            .get("HOST")
            .map(|s| s.as_str())
            .unwrap_or("127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|_| {
                ConfigError::InvalidValue("HOST".to_string(), "must be an IP address".to_string())
            })?;

        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let max_fxql_length = env_map
            .get("MAX_FXQL_LENGTH")
            .map(|s| s.as_str())
            .unwrap_or("10000")
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "MAX_FXQL_LENGTH".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let rate_limit_max = env_map
            .get("RATE_LIMIT_MAX")
            .map(|s| s.as_str())
            .unwrap_or("100")
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "RATE_LIMIT_MAX".to_string(),
                    "must be a positive u32".to_string(),
                )
            })?;

        let rate_limit_window_secs = env_map
            .get("RATE_LIMIT_WINDOW_SECS")
            .map(|s| s.as_str())
            .unwrap_or("60")
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "RATE_LIMIT_WINDOW_SECS".to_string(),
                    "must be a positive number of seconds".to_string(),
                )
            })?;

        Ok(Config {
            host,
            port,
            database_path,
            max_fxql_length,
            rate_limit_max,
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
        })
    }

    /// Defaults for a given database path; used by tests and local tooling.
    pub fn with_database_path(database_path: impl Into<String>) -> Self {
        Config {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            database_path: database_path.into(),
            max_fxql_length: 10_000,
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(60),
        }
    }
}
