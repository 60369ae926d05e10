//! Configuration loader — merges env vars, .env file, and config.toml.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use common::config::MonitorConfig;
use common::{Error, Result};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn parse_positive<T>(raw: &str, env_name: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let parsed = raw
        .trim()
        .parse::<T>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed <= T::default() {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

pub fn validate_config(config: &MonitorConfig) -> Result<()> {
    let mut issues: Vec<String> = Vec::new();

    if config.api_key.trim().is_empty() {
        issues.push("WEATHER_API_KEY is required (set in .env or environment)".into());
    }
    if config.base_url.trim().is_empty() {
        issues.push("base_url must not be empty".into());
    }

    if config.sites.is_empty() {
        issues.push("sites must contain at least one site".into());
    }
    let mut seen = HashSet::new();
    for site in &config.sites {
        if site.name.trim().is_empty() {
            issues.push("site names must not be empty".into());
        } else if !seen.insert(site.name.as_str()) {
            issues.push(format!("duplicate site name: {}", site.name));
        }
        if !(-90.0..=90.0).contains(&site.lat) {
            issues.push(format!("{}: lat must be in [-90, 90]", site.name));
        }
        if !(-180.0..=180.0).contains(&site.lon) {
            issues.push(format!("{}: lon must be in [-180, 180]", site.name));
        }
    }

    let fetch = &config.fetch;
    if fetch.calls_per_minute == 0 {
        issues.push("fetch.calls_per_minute must be > 0".into());
    }
    if fetch.cache_ttl_secs == 0 {
        issues.push("fetch.cache_ttl_secs must be > 0".into());
    }
    if fetch.max_attempts == 0 {
        issues.push("fetch.max_attempts must be > 0".into());
    }
    if fetch.initial_backoff_ms == 0 {
        issues.push("fetch.initial_backoff_ms must be > 0".into());
    }
    if fetch.request_timeout_secs == 0 {
        issues.push("fetch.request_timeout_secs must be > 0".into());
    }
    if fetch.default_retry_after_secs == 0 {
        issues.push("fetch.default_retry_after_secs must be > 0".into());
    }
    if fetch.max_retry_after_secs == 0 {
        issues.push("fetch.max_retry_after_secs must be > 0".into());
    }
    if fetch.max_throttle_waits == 0 {
        issues.push("fetch.max_throttle_waits must be > 0".into());
    }

    if config.timing.poll_interval_secs == 0 {
        issues.push("timing.poll_interval_secs must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Apply `WEATHER_*` environment overrides on top of `config`.
fn apply_env_overrides<F>(config: &mut MonitorConfig, var: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = var("WEATHER_API_KEY") {
        config.api_key = key;
    }
    if let Some(url) = var("WEATHER_BASE_URL") {
        config.base_url = url;
    }
    if let Some(raw) = var("WEATHER_CALLS_PER_MINUTE") {
        config.fetch.calls_per_minute = parse_positive(&raw, "WEATHER_CALLS_PER_MINUTE")?;
    }
    if let Some(raw) = var("WEATHER_CACHE_TTL_SECS") {
        config.fetch.cache_ttl_secs = parse_positive(&raw, "WEATHER_CACHE_TTL_SECS")?;
    }
    if let Some(raw) = var("WEATHER_POLL_INTERVAL_SECS") {
        config.timing.poll_interval_secs = parse_positive(&raw, "WEATHER_POLL_INTERVAL_SECS")?;
    }
    Ok(())
}

/// Read and parse a TOML config file. Read failures surface as `Error::Io`.
fn read_config_file(path: &Path) -> Result<MonitorConfig> {
    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Load monitor configuration from environment and optional config file.
pub fn load_config() -> Result<MonitorConfig> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = MonitorConfig::default();

    // 3. Try loading the config file if it exists.
    let config_path = std::env::var("SITEWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    if config_path.exists() {
        config = read_config_file(&config_path)?;
    }

    // 4. Override with environment variables (highest priority).
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}
