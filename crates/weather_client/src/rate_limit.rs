//! Sliding-window rate limiter for the weather provider.
//!
//! Tracks the instants of admitted calls over the trailing 60 seconds.
//! Callers that would exceed the limit are suspended until the oldest call
//! leaves the window; calls are never dropped.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::info;

/// Width of the rolling window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Calls-per-minute limiter shared by every fetch issued through one client.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    // Held across the wait so admission decisions are serialized.
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// A limit of zero is treated as one call per window.
    pub fn new(calls_per_minute: usize) -> Self {
        Self {
            limit: calls_per_minute.max(1),
            calls: Mutex::new(VecDeque::with_capacity(calls_per_minute.max(1))),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Wait until a call can be made without exceeding the limit, then
    /// record it.
    pub async fn acquire(&self) {
        let mut calls = self.calls.lock().await;

        loop {
            let now = Instant::now();
            evict_expired(&mut calls, now);

            if calls.len() < self.limit {
                break;
            }

            let Some(&oldest) = calls.front() else {
                break;
            };
            let wait = WINDOW.saturating_sub(now.duration_since(oldest));
            if wait.is_zero() {
                continue;
            }

            info!(
                "Rate limit reached ({} calls/min). Waiting for {:.2} seconds",
                self.limit,
                wait.as_secs_f64()
            );
            sleep(wait).await;
        }

        calls.push_back(Instant::now());
    }

    /// Number of calls recorded in the current window.
    pub async fn in_window(&self) -> usize {
        let mut calls = self.calls.lock().await;
        evict_expired(&mut calls, Instant::now());
        calls.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(60)
    }
}

fn evict_expired(calls: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&front) = calls.front() {
        if now.duration_since(front) >= WINDOW {
            calls.pop_front();
        } else {
            break;
        }
    }
}
