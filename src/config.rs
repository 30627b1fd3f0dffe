//! Configuration Module
//!
//! Handles loading cache and scheduler settings from environment variables.

use std::env;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Cache capacity; 0 selects the cache's built-in default
    pub max_cache_size: usize,
    /// Delay in seconds before the first stats report
    pub stats_initial_delay: u64,
    /// Interval in seconds between stats reports, never 0
    pub stats_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Cache capacity (default: 0, meaning built-in default)
    /// - `STATS_INITIAL_DELAY_SECS` - Delay before first stats report (default: 1)
    /// - `STATS_INTERVAL_SECS` - Stats report interval (default: 30, 0 is raised to 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_cache_size: parse_var("CACHE_MAX_SIZE").unwrap_or(defaults.max_cache_size),
            stats_initial_delay: parse_var("STATS_INITIAL_DELAY_SECS")
                .unwrap_or(defaults.stats_initial_delay),
            stats_interval: parse_var("STATS_INTERVAL_SECS")
                .unwrap_or(defaults.stats_interval)
                .max(1),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cache_size: 0,
            stats_initial_delay: 1,
            stats_interval: 30,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
