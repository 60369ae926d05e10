//! Fetch client: cache lookup, rate limiting, and retry around a provider.
//!
//! Each fetch walks a small state machine:
//!
//! ```text
//! cache hit ─────────────────────────────────────────────► Success
//! cache miss ─► Waiting(rate limit) ─► InFlight ─┬─► Success (stored in cache)
//!                     ▲                          ├─► Throttled(wait)   ─┐
//!                     │                          ├─► Transient(n)      ─┤ sleep
//!                     └──────────────────────────┼──────────────────────┘
//!                                                └─► Failed
//! ```
//!
//! Throttle waits do not consume the transient attempt budget.

use std::time::Duration;

use common::config::FetchConfig;
use common::{Error, Result, Sample, Site};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::cache::{CoordKey, ResultCache};
use crate::provider::{ProviderResponse, WeatherProvider};
use crate::rate_limit::RateLimiter;

// ── Provider response body ────────────────────────────────────────────

/// Current-conditions body. Every field is required.
#[derive(Debug, Deserialize)]
pub struct CurrentConditionsResponse {
    pub main: MainReadings,
    pub wind: WindReadings,
    pub weather: Vec<ConditionEntry>,
    pub dt: i64,
}

#[derive(Debug, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub struct WindReadings {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct ConditionEntry {
    pub description: String,
}

/// Decode a provider body into a `Sample` for `site_name`.
pub fn parse_sample(site_name: &str, body: &str) -> Result<Sample> {
    let data: CurrentConditionsResponse = serde_json::from_str(body)
        .map_err(|e| Error::Malformed(format!("{}: {}", site_name, e)))?;

    let conditions = data
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| Error::Malformed(format!("{}: empty weather list", site_name)))?
        .description;

    Ok(Sample {
        site: site_name.to_string(),
        temperature_k: data.main.temp,
        humidity: data.main.humidity,
        wind_speed: data.wind.speed,
        conditions,
        observed_at: data.dt,
    })
}

fn summarize_body(raw: &str) -> String {
    const MAX_CHARS: usize = 500;
    let compact = raw.replace(['\n', '\r'], " ");
    match compact.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => format!("{}…", &compact[..idx]),
        None => compact,
    }
}

// ── Attempt classification ────────────────────────────────────────────

/// Outcome of one in-flight request.
#[derive(Debug)]
enum Attempt {
    Success(Sample),
    Throttled(Duration),
    Transient(Error),
    Failed(Error),
}

// ── Client ────────────────────────────────────────────────────────────

/// Fetches samples for sites, sharing one rate window and one cache across
/// all concurrent calls.
#[derive(Debug)]
pub struct FetchClient<P> {
    provider: P,
    limiter: RateLimiter,
    cache: ResultCache,
    config: FetchConfig,
}

impl<P: WeatherProvider> FetchClient<P> {
    pub fn new(provider: P, config: FetchConfig) -> Self {
        Self {
            provider,
            limiter: RateLimiter::new(config.calls_per_minute),
            cache: ResultCache::new(config.cache_ttl()),
            config,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch a sample for `site`, from cache when fresh.
    ///
    /// Returns `Err` for throttling beyond `max_throttle_waits`, an
    /// exhausted transient budget, a malformed body, or a rejected request.
    pub async fn fetch(&self, site: &Site) -> Result<Sample> {
        let key = CoordKey::for_site(site);
        if let Some(sample) = self.cache.lookup(&key) {
            debug!("Using cached data for {}", site.name);
            return Ok(sample);
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut failed_attempts = 0u32;
        let mut throttle_waits = 0u32;
        let mut backoff = self.config.initial_backoff();

        loop {
            self.limiter.acquire().await;

            debug!(
                "Fetching weather data for {} (attempt {}/{})",
                site.name,
                failed_attempts + 1,
                max_attempts
            );

            match self.attempt(site).await {
                Attempt::Success(sample) => {
                    self.cache.store(key, sample.clone());
                    info!("Retrieved weather data for {}", site.name);
                    return Ok(sample);
                }
                Attempt::Throttled(wait) => {
                    throttle_waits += 1;
                    if throttle_waits > self.config.max_throttle_waits {
                        error!(
                            "{} still throttled after {} waits; giving up",
                            site.name, self.config.max_throttle_waits
                        );
                        return Err(Error::Throttled {
                            retry_after_ms: wait.as_millis() as u64,
                        });
                    }
                    warn!(
                        "Throttled fetching {}. Waiting for {:.2} seconds",
                        site.name,
                        wait.as_secs_f64()
                    );
                    sleep(wait).await;
                }
                Attempt::Transient(e) => {
                    failed_attempts += 1;
                    if failed_attempts >= max_attempts {
                        error!(
                            "Failed to fetch weather data for {} after {} attempts: {}",
                            site.name, failed_attempts, e
                        );
                        return Err(Error::RetriesExhausted {
                            site: site.name.clone(),
                            attempts: failed_attempts,
                            last: Box::new(e),
                        });
                    }
                    warn!(
                        "Fetch for {} failed ({}). Retrying in {:?}",
                        site.name, e, backoff
                    );
                    sleep(backoff).await;
                    backoff *= 2;
                }
                Attempt::Failed(e) => {
                    error!("Fetch for {} failed without retry: {}", site.name, e);
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(&self, site: &Site) -> Attempt {
        match self.provider.current(site).await {
            Ok(resp) => self.classify(site, resp),
            Err(e) if e.is_transient() => Attempt::Transient(e),
            Err(e) => Attempt::Failed(e),
        }
    }

    fn classify(&self, site: &Site, resp: ProviderResponse) -> Attempt {
        match resp.status {
            200..=299 => match parse_sample(&site.name, &resp.body) {
                Ok(sample) => Attempt::Success(sample),
                Err(e) => Attempt::Failed(e),
            },
            429 => Attempt::Throttled(
                resp.retry_after
                    .unwrap_or_else(|| self.config.default_retry_after())
                    .min(self.config.max_retry_after()),
            ),
            status => {
                let err = Error::ProviderStatus {
                    status,
                    message: summarize_body(&resp.body),
                };
                if err.is_transient() {
                    Attempt::Transient(err)
                } else {
                    Attempt::Failed(err)
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    pub(crate) fn body(temp: f64, humidity: f64, wind: f64, description: &str) -> String {
        serde_json::json!({
            "main": {"temp": temp, "humidity": humidity},
            "wind": {"speed": wind},
            "weather": [{"description": description}],
            "dt": 1_700_000_000i64
        })
        .to_string()
    }

    /// Provider that replays scripted responses per site name.
    ///
    /// Once a site's script is exhausted it keeps answering 200 with a
    /// clear-sky body. An optional delay simulates network latency.
    #[derive(Default)]
    pub(crate) struct ScriptedProvider {
        scripts: Mutex<HashMap<String, VecDeque<Result<ProviderResponse>>>>,
        calls: AtomicUsize,
        latency: Duration,
    }

    impl ScriptedProvider {
        pub(crate) fn with_latency(latency: Duration) -> Self {
            Self {
                latency,
                ..Self::default()
            }
        }

        pub(crate) fn script(
            &self,
            site: &str,
            responses: Vec<Result<ProviderResponse>>,
        ) {
            self.scripts
                .lock()
                .unwrap()
                .insert(site.to_string(), responses.into());
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        async fn current(&self, site: &Site) -> Result<ProviderResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                sleep(self.latency).await;
            }
            let next = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(&site.name)
                .and_then(|q| q.pop_front());
            next.unwrap_or_else(|| Ok(ProviderResponse::ok(body(288.0, 50.0, 3.0, "clear sky"))))
        }
    }

    fn site() -> Site {
        Site::new("EU-West", 53.3498, -6.2603)
    }

    fn client(provider: ScriptedProvider) -> FetchClient<ScriptedProvider> {
        FetchClient::new(provider, FetchConfig::default())
    }

    fn throttled(secs: u64) -> Result<ProviderResponse> {
        Ok(ProviderResponse {
            status: 429,
            retry_after: Some(Duration::from_secs(secs)),
            body: String::new(),
        })
    }

    #[test]
    fn test_parse_sample_maps_fields() {
        let sample = parse_sample("Asia-Tokyo", &body(300.5, 72.0, 4.5, "light rain"))
            .expect("well-formed body");

        assert_eq!(sample.site, "Asia-Tokyo");
        assert_eq!(sample.temperature_k, 300.5);
        assert_eq!(sample.humidity, 72.0);
        assert_eq!(sample.wind_speed, 4.5);
        assert_eq!(sample.conditions, "light rain");
        assert_eq!(sample.observed_at, 1_700_000_000);
    }

    #[test]
    fn test_parse_sample_rejects_missing_fields() {
        let missing_wind = r#"{"main":{"temp":280.0,"humidity":10},"weather":[{"description":"x"}],"dt":1}"#;
        let empty_weather = r#"{"main":{"temp":280.0,"humidity":10},"wind":{"speed":1},"weather":[],"dt":1}"#;

        assert!(matches!(
            parse_sample("A", missing_wind),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            parse_sample("A", empty_weather),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            parse_sample("A", "<html>oops</html>"),
            Err(Error::Malformed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_cached_and_skips_limiter() {
        let client = client(ScriptedProvider::default());

        let first = client.fetch(&site()).await.expect("fetch should succeed");
        assert_eq!(client.limiter().in_window().await, 1);

        let second = client.fetch(&site()).await.expect("cache hit");
        assert_eq!(first, second);
        assert_eq!(client.provider().calls(), 1);
        assert_eq!(client.limiter().in_window().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_cache_refetches() {
        let client = client(ScriptedProvider::default());

        client.fetch(&site()).await.expect("first fetch");
        tokio::time::advance(Duration::from_secs(601)).await;
        client.fetch(&site()).await.expect("second fetch");

        assert_eq!(client.provider().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_back_off_exponentially() {
        let provider = ScriptedProvider::default();
        provider.script(
            "EU-West",
            vec![
                Ok(ProviderResponse::status(503)),
                Err(Error::Http("connection reset".into())),
            ],
        );
        let client = client(provider);
        let start = Instant::now();

        let sample = client.fetch(&site()).await.expect("third attempt succeeds");

        assert_eq!(sample.site, "EU-West");
        assert_eq!(client.provider().calls(), 3);
        assert_eq!(Instant::now().duration_since(start), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhausted() {
        let provider = ScriptedProvider::default();
        provider.script(
            "EU-West",
            vec![
                Ok(ProviderResponse::status(500)),
                Ok(ProviderResponse::status(502)),
                Ok(ProviderResponse::status(503)),
            ],
        );
        let client = client(provider);

        let err = client.fetch(&site()).await.unwrap_err();

        match err {
            Error::RetriesExhausted { attempts, last, .. } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, Error::ProviderStatus { status: 503, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(client.provider().calls(), 3);
        assert!(client.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_waits_do_not_consume_attempts() {
        let provider = ScriptedProvider::default();
        provider.script(
            "EU-West",
            vec![
                throttled(5),
                Ok(ProviderResponse::status(500)),
                throttled(5),
                Ok(ProviderResponse::status(500)),
            ],
        );
        let client = client(provider);
        let start = Instant::now();

        client
            .fetch(&site())
            .await
            .expect("fifth call succeeds within budget");

        assert_eq!(client.provider().calls(), 5);
        // 5 + 1 + 5 + 2 seconds of waiting.
        assert_eq!(Instant::now().duration_since(start), Duration::from_secs(13));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_without_retry_after_uses_default() {
        let provider = ScriptedProvider::default();
        provider.script("EU-West", vec![Ok(ProviderResponse::status(429))]);
        let client = client(provider);
        let start = Instant::now();

        client.fetch(&site()).await.expect("retry succeeds");

        assert_eq!(Instant::now().duration_since(start), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_retry_after_is_clamped() {
        let provider = ScriptedProvider::default();
        provider.script("EU-West", vec![throttled(86_400)]);
        let client = client(provider);
        let start = Instant::now();

        client.fetch(&site()).await.expect("retry succeeds after clamped wait");

        assert_eq!(client.provider().calls(), 2);
        assert_eq!(Instant::now().duration_since(start), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_cap_gives_up() {
        let provider = ScriptedProvider::default();
        provider.script("EU-West", (0..4).map(|_| throttled(1)).collect());
        let config = FetchConfig {
            max_throttle_waits: 3,
            ..FetchConfig::default()
        };
        let client = FetchClient::new(provider, config);

        let err = client.fetch(&site()).await.unwrap_err();

        assert!(matches!(err, Error::Throttled { retry_after_ms: 1000 }));
        assert_eq!(client.provider().calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body_fails_without_retry() {
        let provider = ScriptedProvider::default();
        provider.script(
            "EU-West",
            vec![Ok(ProviderResponse::ok(r#"{"main":{"temp":280.0}}"#))],
        );
        let client = client(provider);

        let err = client.fetch(&site()).await.unwrap_err();

        assert!(matches!(err, Error::Malformed(_)));
        assert_eq!(client.provider().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_status_is_not_retried() {
        let provider = ScriptedProvider::default();
        provider.script("EU-West", vec![Ok(ProviderResponse::status(401))]);
        let client = client(provider);

        let err = client.fetch(&site()).await.unwrap_err();

        assert!(matches!(err, Error::ProviderStatus { status: 401, .. }));
        assert_eq!(client.provider().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_attempt_is_rate_limited() {
        let provider = ScriptedProvider::default();
        provider.script(
            "EU-West",
            vec![Ok(ProviderResponse::status(500)), Ok(ProviderResponse::status(500))],
        );
        let config = FetchConfig {
            calls_per_minute: 2,
            ..FetchConfig::default()
        };
        let client = FetchClient::new(provider, config);
        let start = Instant::now();

        client.fetch(&site()).await.expect("third attempt succeeds");

        // Attempts at t=0 and t=1; the third must wait for t=60.
        assert_eq!(client.provider().calls(), 3);
        assert_eq!(Instant::now().duration_since(start), Duration::from_secs(60));
    }

    #[test]
    fn test_summarize_body_truncates() {
        let long = "x".repeat(600);
        let summary = summarize_body(&long);
        assert!(summary.ends_with('…'));
        assert_eq!(summary.chars().count(), 501);
        assert_eq!(summarize_body("a\nb"), "a b");
    }
}
