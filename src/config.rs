//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::DEFAULT_CAPACITY;
use crate::pagination::{SizingStrategy, DEFAULT_MAX_COLUMN_WIDTH, DEFAULT_MAX_TOKENS};
use crate::tools::DEFAULT_EXPORT_DIR;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of datasets the cache can hold
    pub cache_capacity: usize,
    /// Token budget per page when a call does not set one
    pub max_tokens: usize,
    /// Cap on table column width in characters
    pub max_column_width: usize,
    /// How items per page is chosen
    pub page_sizing: SizingStrategy,
    /// Collapse concurrent misses on one key into a single fetch
    pub dedupe_fetches: bool,
    /// HTTP server port
    pub server_port: u16,
    /// Root directory of the fixture data provider
    pub fixture_dir: PathBuf,
    /// Directory every export is written under
    pub export_dir: PathBuf,
    /// Per-fetch time limit in milliseconds, 0 disables it
    pub fetch_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cached datasets (default: 100)
    /// - `MAX_TOKENS` - Default page budget, must be positive (default: 6000)
    /// - `MAX_COLUMN_WIDTH` - Table column cap (default: 15)
    /// - `PAGE_SIZING` - `adaptive` or `fixed` (default: adaptive)
    /// - `DEDUPE_FETCHES` - `true` to de-duplicate concurrent fetches (default: false)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `FIXTURE_DIR` - Fixture provider root (default: ./fixtures)
    /// - `EXPORT_DIR` - Export root (default: ./exports)
    /// - `FETCH_TIMEOUT_MS` - Provider fetch limit, 0 for none (default: 5000)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_capacity: env_or("CACHE_CAPACITY", defaults.cache_capacity),
            max_tokens: Some(env_or("MAX_TOKENS", defaults.max_tokens))
                .filter(|&tokens| tokens > 0)
                .unwrap_or(defaults.max_tokens),
            max_column_width: env_or("MAX_COLUMN_WIDTH", defaults.max_column_width),
            page_sizing: env_or("PAGE_SIZING", defaults.page_sizing),
            dedupe_fetches: env_or("DEDUPE_FETCHES", defaults.dedupe_fetches),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            fixture_dir: env_path("FIXTURE_DIR").unwrap_or(defaults.fixture_dir),
            export_dir: env_path("EXPORT_DIR").unwrap_or(defaults.export_dir),
            fetch_timeout_ms: env_or("FETCH_TIMEOUT_MS", defaults.fetch_timeout_ms),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            page_sizing: SizingStrategy::AdaptiveHalving,
            dedupe_fetches: false,
            server_port: 3000,
            fixture_dir: PathBuf::from("./fixtures"),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            fetch_timeout_ms: 5000,
        }
    }
}
