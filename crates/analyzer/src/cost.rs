//! Estimated daily cost impact per site.
//!
//! cost = cooling factor × humidity adjustment × severe-weather multiplier
//! × base daily cost, rounded to cents.

use std::collections::BTreeMap;

use common::Sample;

use crate::{mentions_any, SEVERE_KEYWORDS};

/// Base daily cost in dollars that the factor scales.
pub const BASE_DAILY_COST: f64 = 100.0;
const HUMIDITY_BASELINE: f64 = 60.0;
const SEVERE_MULTIPLIER: f64 = 1.5;

pub fn daily_cost_impact(sample: &Sample) -> f64 {
    let mut factor = sample.cooling_cost_factor();

    if sample.humidity > HUMIDITY_BASELINE {
        factor *= 1.0 + (sample.humidity - HUMIDITY_BASELINE) / 100.0;
    }

    // Severe weather may bring backup systems online.
    if mentions_any(&sample.conditions, SEVERE_KEYWORDS) {
        factor *= SEVERE_MULTIPLIER;
    }

    round_cents(factor * BASE_DAILY_COST)
}

pub fn cost_impacts(samples: &[Sample]) -> BTreeMap<String, f64> {
    samples
        .iter()
        .map(|s| (s.site.clone(), daily_cost_impact(s)))
        .collect()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
