//! Current-conditions fetch pipeline.
//!
//! Rate-limited, cached, retrying requests against a weather provider,
//! fanned out across all monitored sites.

pub mod cache;
pub mod client;
pub mod orchestrator;
pub mod provider;
pub mod rate_limit;

pub use cache::{CacheEntry, CoordKey, ResultCache};
pub use client::{parse_sample, FetchClient};
pub use orchestrator::{CollectOutcome, Orchestrator};
pub use provider::{OpenWeatherProvider, ProviderResponse, WeatherProvider};
pub use rate_limit::RateLimiter;
