// src/config.rs
//! Environment-driven configuration. No CLI flags; `.env` participates when
//! the entrypoint calls `dotenvy::dotenv()` first.

use std::path::PathBuf;

use serde::Serialize;

// --- env names & defaults ---
pub const ENV_KEYWORD: &str = "MONITOR_KEYWORD";
pub const ENV_REFRESH_INTERVAL_SECS: &str = "MONITOR_REFRESH_INTERVAL_SECS";
pub const ENV_SENTIMENT_THRESHOLD: &str = "MONITOR_SENTIMENT_THRESHOLD";
pub const ENV_DATA_PATH: &str = "MONITOR_DATA_PATH";
pub const ENV_FETCH_LIMIT: &str = "MONITOR_FETCH_LIMIT";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "MONITOR_FETCH_TIMEOUT_SECS";

pub const DEFAULT_KEYWORD: &str = "china";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_SENTIMENT_THRESHOLD: f64 = 0.1;
pub const DEFAULT_DATA_PATH: &str = "data/records.json";
pub const DEFAULT_FETCH_LIMIT: usize = 25;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct MonitorConfig {
    /// Topic keyword for the relevance filter (case-insensitive substring).
    pub keyword: String,
    pub refresh_interval_secs: u64,
    /// Symmetric category threshold in [0.0, 1.0].
    pub sentiment_threshold: f64,
    pub data_path: PathBuf,
    pub fetch_limit: usize,
    pub fetch_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            keyword: DEFAULT_KEYWORD.to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            sentiment_threshold: DEFAULT_SENTIMENT_THRESHOLD,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl MonitorConfig {
    /// Read configuration from the environment; unset or unparsable values
    /// fall back to the defaults above.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            keyword: env_string(ENV_KEYWORD).unwrap_or(d.keyword),
            refresh_interval_secs: env_parse(ENV_REFRESH_INTERVAL_SECS)
                .unwrap_or(d.refresh_interval_secs),
            sentiment_threshold: parse_threshold(env_string(ENV_SENTIMENT_THRESHOLD))
                .unwrap_or(d.sentiment_threshold),
            data_path: env_string(ENV_DATA_PATH)
                .map(PathBuf::from)
                .unwrap_or(d.data_path),
            fetch_limit: env_parse(ENV_FETCH_LIMIT).unwrap_or(d.fetch_limit),
            fetch_timeout_secs: env_parse(ENV_FETCH_TIMEOUT_SECS)
                .unwrap_or(d.fetch_timeout_secs),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|s| s.parse().ok())
}

// parse optional float and clamp to <0.0..=1.0>
fn parse_threshold(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .map(|v| v.clamp(0.0, 1.0))
}
