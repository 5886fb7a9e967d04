//! Configuration Module
//!
//! Handles loading and managing service configuration from environment
//! variables (optionally seeded from a `.env` file).

use std::env;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{DEFAULT_MAX_SIZE, DEFAULT_TTL_SECS};
use crate::error::{CacheError, Result};

/// Construction-time options of a cache instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub max_size: usize,
    /// Freshness window
    pub ttl: Duration,
}

impl CacheConfig {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self { max_size, ttl }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Options of the database read cache
    pub cache: CacheConfig,
    /// Background purge task interval in seconds
    pub purge_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Root URL of the realtime database REST API
    pub database_url: String,
    /// Optional `auth` token appended to database requests
    pub database_auth: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cached reads (default: 100)
    /// - `CACHE_TTL` - Freshness window in seconds, fractions allowed (default: 300)
    /// - `PURGE_INTERVAL` - Purge frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DATABASE_URL` - Realtime database root (default: http://127.0.0.1:9000)
    /// - `DATABASE_AUTH` - Database auth token (default: unset)
    pub fn from_env() -> Self {
        report_env_file(dotenvy::dotenv());
        let defaults = Self::default();

        Self {
            cache: CacheConfig {
                max_size: parse_var("CACHE_MAX_SIZE").unwrap_or(defaults.cache.max_size),
                ttl: parse_var::<f64>("CACHE_TTL")
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                    .unwrap_or(defaults.cache.ttl),
            },
            purge_interval: parse_var("PURGE_INTERVAL").unwrap_or(defaults.purge_interval),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_auth: env::var("DATABASE_AUTH").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Rejects values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;

        if self.purge_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "PURGE_INTERVAL must be at least 1 second".to_string(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(CacheError::InvalidConfig(
                "DATABASE_URL must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            purge_interval: 60,
            server_port: 3000,
            database_url: "http://127.0.0.1:9000".to_string(),
            database_auth: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// What happened when looking for a `.env` file.
#[derive(Debug, PartialEq, Eq)]
enum EnvFile {
    Loaded,
    Missing,
    Invalid,
}

fn report_env_file<T>(result: dotenvy::Result<T>) -> EnvFile {
    match result {
        Ok(_) => {
            debug!("Loaded environment variables from .env file");
            EnvFile::Loaded
        }
        Err(e) if e.not_found() => {
            debug!("No .env file found, using process environment");
            EnvFile::Missing
        }
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable .env file");
            EnvFile::Invalid
        }
    }
}
