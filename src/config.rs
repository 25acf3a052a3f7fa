//! Runtime configuration.
//!
//! Values are read from the environment (after loading an optional `.env`
//! file) and may be overridden by command-line flags.

use crate::error::{FinanceError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CONFLICT_RETRIES: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Fallback filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// JSON risk policy; the built-in table is used when absent.
    pub policy_path: Option<PathBuf>,
    /// Persistent finance request store location.
    pub db_path: Option<PathBuf>,
    /// Upper bound on any single store call.
    pub store_timeout: Duration,
    /// Extra attempts after a transition loses a compare-and-swap race.
    pub max_conflict_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            policy_path: None,
            db_path: None,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            max_conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(level) = lookup("FINANCE_LOG_LEVEL") {
            config.log_level = level;
        }
        config.policy_path = lookup("FINANCE_POLICY_PATH").map(PathBuf::from);
        config.db_path = lookup("FINANCE_DB_PATH").map(PathBuf::from);

        if let Some(raw) = lookup("FINANCE_STORE_TIMEOUT_MS") {
            let millis: u64 = raw.parse().map_err(|_| {
                FinanceError::Config(format!("FINANCE_STORE_TIMEOUT_MS must be an integer, got '{raw}'"))
            })?;
            if millis == 0 {
                return Err(FinanceError::Config(
                    "FINANCE_STORE_TIMEOUT_MS must be greater than 0".to_string(),
                ));
            }
            config.store_timeout = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup("FINANCE_CONFLICT_RETRIES") {
            config.max_conflict_retries = raw.parse().map_err(|_| {
                FinanceError::Config(format!("FINANCE_CONFLICT_RETRIES must be an integer, got '{raw}'"))
            })?;
        }

        Ok(config)
    }
}
