//! Analyzer crate.
//!
//! Pure transformations from a batch of samples into extreme-condition
//! flags, daily cost impacts, and ordinal risk assessments. Results are
//! keyed by site name.

pub mod cost;
pub mod extremes;
pub mod risk;

use std::collections::BTreeMap;

use common::Sample;
use serde::Serialize;
use tracing::debug;

pub use cost::{cost_impacts, daily_cost_impact};
pub use extremes::{extreme_conditions, flags_for, ConditionFlag};
pub use risk::{assess, risk_assessment, RiskAssessment, RiskLevel};

pub(crate) const SEVERE_KEYWORDS: &[&str] = &["storm", "thunder", "hurricane", "tornado"];
pub(crate) const DESTRUCTIVE_KEYWORDS: &[&str] = &["hurricane", "tornado"];
pub(crate) const STORM_KEYWORDS: &[&str] = &["storm", "thunder"];
pub(crate) const PRECIPITATION_KEYWORDS: &[&str] = &["rain", "shower", "drizzle"];

/// Case-insensitive substring match against any keyword.
pub(crate) fn mentions_any(conditions: &str, keywords: &[&str]) -> bool {
    let lowered = conditions.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

/// All three result sets for one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub extreme_conditions: BTreeMap<String, Vec<ConditionFlag>>,
    pub cost_impacts: BTreeMap<String, f64>,
    pub risk_assessments: BTreeMap<String, RiskAssessment>,
}

impl Analysis {
    pub fn total_cost_impact(&self) -> f64 {
        self.cost_impacts.values().sum()
    }
}

pub fn analyze(samples: &[Sample]) -> Analysis {
    let analysis = Analysis {
        extreme_conditions: extreme_conditions(samples),
        cost_impacts: cost_impacts(samples),
        risk_assessments: risk_assessment(samples),
    };
    debug!(
        "Analyzed {} samples: {} flagged, total impact ${:.2}",
        samples.len(),
        analysis.extreme_conditions.len(),
        analysis.total_cost_impact()
    );
    analysis
}

#[cfg(test)]
pub(crate) fn sample(temperature_k: f64, humidity: f64, wind_speed: f64, conditions: &str) -> Sample {
    Sample {
        site: "test-site".into(),
        temperature_k,
        humidity,
        wind_speed,
        conditions: conditions.into(),
        observed_at: 1_700_000_000,
    }
}
