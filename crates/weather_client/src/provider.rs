//! Current-conditions provider.
//!
//! `WeatherProvider` returns the raw HTTP outcome of a single request;
//! classifying it (throttled, transient, malformed) is left to the
//! `FetchClient`.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use common::config::MonitorConfig;
use common::{Error, Result, Site};
use reqwest::header::RETRY_AFTER;
use tracing::debug;

/// Raw response of one provider request.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: u16,
    /// Parsed `Retry-After` header, when present as delta-seconds.
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl ProviderResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            retry_after: None,
            body: String::new(),
        }
    }
}

/// One request for current conditions at a site.
///
/// Transport failures (DNS, TLS, timeouts) are reported as `Error::Http`.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, site: &Site) -> Result<ProviderResponse>;
}

/// OpenWeatherMap-style provider over reqwest.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    units: String,
}

impl OpenWeatherProvider {
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("sitewatch/0.1")
            .pool_max_idle_per_host(4)
            .timeout(config.fetch.request_timeout())
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            units: config.units.clone(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, site: &Site) -> Result<ProviderResponse> {
        debug!(
            "Requesting current conditions: {} lat={} lon={}",
            self.base_url, site.lat, site.lon
        );

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", site.lat.to_string()),
                ("lon", site.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.units.clone()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("{}: {}", site.name, format_reqwest_error(&e))))?;

        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("{}: {}", site.name, format_reqwest_error(&e))))?;

        Ok(ProviderResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Delta-seconds form only; HTTP-date values fall back to the default wait.
pub fn parse_retry_after(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn format_reqwest_error(err: &reqwest::Error) -> String {
    // Keep chained causes so DNS/TLS/socket failures are visible.
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !cause_msg.is_empty() && !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }

    message
}
