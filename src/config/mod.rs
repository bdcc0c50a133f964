//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;

use crate::util::time::DEFAULT_TICK_RATE;

/// Runtime configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Seed shared by every participant of the match
    pub match_seed: u64,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Static asset JSON; the built-in arena when unset
    pub assets_path: Option<PathBuf>,
    /// Replay a recorded log headlessly instead of hosting
    pub replay_path: Option<PathBuf>,
    /// Where to save the hosted session's replay on shutdown
    pub record_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let tick_rate = match env::var("TICK_RATE") {
            Ok(raw) => match raw.parse::<u32>() {
                Ok(rate) if rate > 0 => rate,
                _ => return Err(ConfigError::Invalid("TICK_RATE", raw)),
            },
            Err(_) => DEFAULT_TICK_RATE,
        };

        let match_seed = match env::var("MATCH_SEED") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("MATCH_SEED", raw))?,
            Err(_) => 0,
        };

        Ok(Self {
            tick_rate,
            match_seed,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            assets_path: env::var("ASSETS_PATH").ok().map(PathBuf::from),
            replay_path: env::var("REPLAY_PATH").ok().map(PathBuf::from),
            record_path: env::var("RECORD_PATH").ok().map(PathBuf::from),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}
