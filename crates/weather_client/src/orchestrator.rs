//! Scatter/gather across all configured sites.

use std::sync::Arc;

use common::{Error, Sample, Site};
use futures_util::future::join_all;
use tracing::{error, info, warn};

use crate::client::FetchClient;
use crate::provider::WeatherProvider;

/// Result of one collection run.
#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub samples: Vec<Sample>,
    /// Site name and the reason no sample was obtained.
    pub failures: Vec<(String, Error)>,
}

impl CollectOutcome {
    /// True when no site produced a sample.
    pub fn is_total_failure(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Fans fetches out over every site concurrently and gathers the results.
#[derive(Debug)]
pub struct Orchestrator<P> {
    client: Arc<FetchClient<P>>,
}

impl<P> Clone for Orchestrator<P> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<P: WeatherProvider> Orchestrator<P> {
    pub fn new(client: Arc<FetchClient<P>>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &FetchClient<P> {
        &self.client
    }

    /// Samples for every site whose fetch succeeded, in no guaranteed order.
    pub async fn collect(&self, sites: &[Site]) -> Vec<Sample> {
        self.collect_outcome(sites).await.samples
    }

    /// Like `collect`, but also reports why each failed site has no sample.
    pub async fn collect_outcome(&self, sites: &[Site]) -> CollectOutcome {
        let fetches = sites.iter().map(|site| {
            let client = Arc::clone(&self.client);
            async move { (site.name.clone(), client.fetch(site).await) }
        });

        let mut outcome = CollectOutcome::default();
        for (name, result) in join_all(fetches).await {
            match result {
                Ok(sample) => outcome.samples.push(sample),
                Err(e) => {
                    warn!("No sample for {}: {}", name, e);
                    outcome.failures.push((name, e));
                }
            }
        }

        if outcome.is_total_failure() && !sites.is_empty() {
            error!("Failed to fetch weather data for all {} sites", sites.len());
        } else {
            info!(
                "Collected {} samples ({} failed)",
                outcome.samples.len(),
                outcome.failures.len()
            );
        }

        outcome
    }
}
