//! sitewatch: weather risk monitor for data-center sites.
//!
//! Single-binary Tokio application that:
//! 1. Fetches current conditions for every configured site concurrently
//! 2. Rate-limits, caches, and retries provider calls
//! 3. Derives extreme-condition flags, cost impacts, and risk levels
//! 4. Prints a report, once or on an interval

mod config;
mod report;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tokio::time::sleep;
use tracing::{error, info};

use common::config::MonitorConfig;
use weather_client::{FetchClient, OpenWeatherProvider, Orchestrator};

use crate::report::CycleReport;

/// Weather risk monitor for data-center sites
#[derive(Parser)]
#[command(name = "sitewatch", about = "Weather risk monitor for data-center sites")]
struct Cli {
    /// Keep running, one cycle every `timing.poll_interval_secs`.
    #[arg(long)]
    watch: bool,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Run one collect/analyze/report cycle. Returns false if no site produced
/// a sample.
async fn run_cycle(
    orchestrator: &Orchestrator<OpenWeatherProvider>,
    cfg: &MonitorConfig,
    as_json: bool,
) -> bool {
    let outcome = orchestrator.collect_outcome(&cfg.sites).await;
    // The orchestrator has already logged the total failure.
    if outcome.is_total_failure() {
        return false;
    }

    let analysis = analyzer::analyze(&outcome.samples);
    let report = CycleReport {
        generated_at: Utc::now(),
        samples: &outcome.samples,
        analysis: &analysis,
        failed_sites: outcome.failures.iter().map(|(n, _)| n.clone()).collect(),
    };

    if as_json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to render JSON report: {}", e);
                return false;
            }
        }
    } else {
        println!("{}", report.to_text());
    }

    true
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sitewatch=info,weather_client=info,analyzer=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("sitewatch starting up...");

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Sites: {:?}",
        cfg.sites.iter().map(|s| &s.name).collect::<Vec<_>>()
    );
    info!(
        "Fetch: {} calls/min, cache ttl={}s, attempts={}, timeout={}s",
        cfg.fetch.calls_per_minute,
        cfg.fetch.cache_ttl_secs,
        cfg.fetch.max_attempts,
        cfg.fetch.request_timeout_secs,
    );

    let provider = match OpenWeatherProvider::new(&cfg) {
        Ok(p) => p,
        Err(e) => {
            error!("Provider initialization failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // One client for the whole process so the rate window and cache
    // persist across cycles.
    let client = Arc::new(FetchClient::new(provider, cfg.fetch.clone()));
    let orchestrator = Orchestrator::new(client);

    if !cli.watch {
        return if run_cycle(&orchestrator, &cfg, cli.json).await {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let interval = Duration::from_secs(cfg.timing.poll_interval_secs);
    info!("Watch mode: polling every {:?}", interval);
    loop {
        tokio::select! {
            _ = run_cycle(&orchestrator, &cfg, cli.json) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        tokio::select! {
            _ = sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Shutting down");
    ExitCode::SUCCESS
}
