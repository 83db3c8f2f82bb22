//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::FixedOffset;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub log_level: Level,
    pub poll_interval: Duration,
    pub lookahead_days: i64,
    /// Zone used when a client does not say where it is.
    pub default_utc_offset: FixedOffset,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address: SocketAddr = parse_or(&lookup, "BIND_ADDRESS", "0.0.0.0:3000".parse().ok())?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let db_max_connections: u32 = parse_or(&lookup, "DB_MAX_CONNECTIONS", Some(5))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Reminder Polling Settings ---
        let poll_interval_secs: u64 = parse_or(&lookup, "POLL_INTERVAL_SECS", Some(300))?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "POLL_INTERVAL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let lookahead_days: i64 = parse_or(&lookup, "LOOKAHEAD_DAYS", Some(7))?;
        if !(0..=366).contains(&lookahead_days) {
            return Err(ConfigError::InvalidValue(
                "LOOKAHEAD_DAYS".to_string(),
                format!("{} is outside 0..=366", lookahead_days),
            ));
        }

        let offset_minutes: i32 = parse_or(&lookup, "DEFAULT_UTC_OFFSET_MINUTES", Some(0))?;
        let default_utc_offset = utc_offset_from_minutes(offset_minutes).ok_or_else(|| {
            ConfigError::InvalidValue(
                "DEFAULT_UTC_OFFSET_MINUTES".to_string(),
                format!("{} is not a valid UTC offset", offset_minutes),
            )
        })?;

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            db_max_connections,
            log_level,
            poll_interval: Duration::from_secs(poll_interval_secs),
            lookahead_days,
            default_utc_offset,
            allowed_origin,
        })
    }
}

/// Converts a client-supplied offset (minutes east of UTC) into a zone.
pub fn utc_offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    if minutes.abs() >= 24 * 60 {
        return None;
    }
    FixedOffset::east_opt(minutes * 60)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(key.to_string())),
    }
}
