//! Monitor configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::Site;

/// Top-level monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Provider credential, sent as the `appid` query parameter.
    #[serde(default)]
    pub api_key: String,

    /// Current-conditions endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Units selector. `standard` reports temperature in Kelvin.
    #[serde(default = "default_units")]
    pub units: String,

    /// Sites to monitor.
    #[serde(default = "default_sites")]
    pub sites: Vec<Site>,

    /// Fetch pipeline limits.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Timing parameters (seconds).
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Rate limiting, caching and retry knobs for the fetch path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Outbound calls allowed in any trailing 60 seconds.
    #[serde(default = "default_calls_per_minute")]
    pub calls_per_minute: usize,

    /// Seconds a cached sample stays fresh.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Attempts per fetch for transient failures.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay; doubles after each failed attempt.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Wait used when a 429 carries no usable Retry-After.
    #[serde(default = "default_retry_after")]
    pub default_retry_after_secs: u64,

    /// Longest single 429 wait; larger Retry-After values are clamped.
    #[serde(default = "default_max_retry_after")]
    pub max_retry_after_secs: u64,

    /// Upper bound on 429 waits within a single fetch.
    #[serde(default = "default_max_throttle_waits")]
    pub max_throttle_waits: u32,
}

/// Timing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Seconds between cycles in watch mode.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl FetchConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }

    pub fn max_retry_after(&self) -> Duration {
        Duration::from_secs(self.max_retry_after_secs)
    }
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".into()
}
fn default_units() -> String {
    "standard".into()
}

fn default_calls_per_minute() -> usize {
    60
}
fn default_cache_ttl() -> u64 {
    600
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_request_timeout() -> u64 {
    10
}
fn default_retry_after() -> u64 {
    1
}
fn default_max_retry_after() -> u64 {
    60
}
fn default_max_throttle_waits() -> u32 {
    10
}

fn default_poll_interval() -> u64 {
    300
}

fn default_sites() -> Vec<Site> {
    vec![
        Site::new("US-East", 37.7749, -122.4194),
        Site::new("EU-West", 53.3498, -6.2603),
        Site::new("Asia-Tokyo", 35.6762, 139.6503),
        Site::new("Australia-Sydney", -33.8688, 151.2093),
        Site::new("South America-Sao Paulo", -23.5505, -46.6333),
    ]
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            calls_per_minute: default_calls_per_minute(),
            cache_ttl_secs: default_cache_ttl(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            request_timeout_secs: default_request_timeout(),
            default_retry_after_secs: default_retry_after(),
            max_retry_after_secs: default_max_retry_after(),
            max_throttle_waits: default_max_throttle_waits(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            units: default_units(),
            sites: default_sites(),
            fetch: FetchConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}
