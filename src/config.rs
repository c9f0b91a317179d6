//! Browser Configuration
//!
//! Defaults can be overridden from the environment:
//! - `BROWSER_ROWS`, `BROWSER_COLS`: grid dimensions.
//! - `BROWSER_STATS_INTERVAL_MS`: statistics polling period.
//! - `BROWSER_SESSION_VARS_INTERVAL_MS`: session variable merge period, `-1` disables merging.

use crate::grid::gate::{DEFAULT_COLS, DEFAULT_ROWS};
use crate::stats::poller::DEFAULT_STATS_INTERVAL;
use crate::stats::variables::DEFAULT_SESSION_VARS_INTERVAL;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_ROWS: &str = "BROWSER_ROWS";
pub const ENV_COLS: &str = "BROWSER_COLS";
pub const ENV_STATS_INTERVAL: &str = "BROWSER_STATS_INTERVAL_MS";
pub const ENV_SESSION_VARS_INTERVAL: &str = "BROWSER_SESSION_VARS_INTERVAL_MS";

/// Upper bound on `rows * cols`.
pub const MAX_GRID_SLOTS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("grid must have at least one row and one column")]
    EmptyGrid,

    #[error("grid of {rows}x{cols} exceeds {max} slots", max = MAX_GRID_SLOTS)]
    GridTooLarge { rows: usize, cols: usize },

    #[error("statistics interval must be greater than zero")]
    ZeroStatsInterval,

    #[error("session variable interval must be greater than zero")]
    ZeroSessionVarsInterval,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub rows: usize,
    pub cols: usize,
    pub stats_interval_ms: u64,
    /// `None` disables session variable merging.
    pub session_vars_interval_ms: Option<u64>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            stats_interval_ms: DEFAULT_STATS_INTERVAL.as_millis() as u64,
            session_vars_interval_ms: Some(DEFAULT_SESSION_VARS_INTERVAL.as_millis() as u64),
        }
    }
}

impl BrowserConfig {
    /// Defaults overlaid with the `BROWSER_*` environment variables, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_ROWS) {
            config.rows = parse(ENV_ROWS, &value)?;
        }
        if let Some(value) = lookup(ENV_COLS) {
            config.cols = parse(ENV_COLS, &value)?;
        }
        if let Some(value) = lookup(ENV_STATS_INTERVAL) {
            config.stats_interval_ms = parse(ENV_STATS_INTERVAL, &value)?;
        }
        if let Some(value) = lookup(ENV_SESSION_VARS_INTERVAL) {
            let ms: i64 = parse(ENV_SESSION_VARS_INTERVAL, &value)?;
            config.session_vars_interval_ms = match ms {
                -1 => None,
                ms if ms < 0 => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_SESSION_VARS_INTERVAL.to_string(),
                        value,
                    });
                }
                ms => Some(ms as u64),
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        grid_capacity(self.rows, self.cols)?;
        if self.stats_interval_ms == 0 {
            return Err(ConfigError::ZeroStatsInterval);
        }
        if self.session_vars_interval_ms == Some(0) {
            return Err(ConfigError::ZeroSessionVarsInterval);
        }
        Ok(())
    }

    /// Slot count. Saturates for configurations `validate` would reject.
    pub fn capacity(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn session_vars_interval(&self) -> Option<Duration> {
        self.session_vars_interval_ms.map(Duration::from_millis)
    }
}

/// Number of slots in a `rows` x `cols` grid, if that grid is allowed.
pub fn grid_capacity(rows: usize, cols: usize) -> Result<usize, ConfigError> {
    if rows == 0 || cols == 0 {
        return Err(ConfigError::EmptyGrid);
    }
    rows.checked_mul(cols)
        .filter(|&slots| slots <= MAX_GRID_SLOTS)
        .ok_or(ConfigError::GridTooLarge { rows, cols })
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
