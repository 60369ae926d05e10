//! Ordinal risk assessment per site.
//!
//! A site starts at `Low` and each matching rule can only raise the level.

use std::collections::BTreeMap;
use std::fmt;

use common::Sample;
use serde::Serialize;

use crate::{mentions_any, DESTRUCTIVE_KEYWORDS, PRECIPITATION_KEYWORDS, STORM_KEYWORDS};

const CRITICAL_HEAT_C: f64 = 40.0;
const HIGH_HEAT_C: f64 = 35.0;
const SEVERE_COLD_C: f64 = -5.0;
const DAMAGING_WIND_MS: f64 = 20.0;
const MODERATE_WIND_MS: f64 = 10.0;

const NORMAL_OPERATIONS: &str = "Normal operating conditions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Max-merge: never lowers the level.
    pub fn raise(&mut self, to: RiskLevel) {
        *self = (*self).max(to);
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// Level plus the reasons that produced it, in rule order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub factors: Vec<String>,
}

impl RiskAssessment {
    fn new() -> Self {
        Self {
            level: RiskLevel::Low,
            factors: Vec::new(),
        }
    }

    fn add(&mut self, level: RiskLevel, factor: &str) {
        self.level.raise(level);
        self.factors.push(factor.to_string());
    }
}

/// Renders as `"<Level> risk - reason; reason"`.
impl fmt::Display for RiskAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            write!(f, "{} risk - {}", self.level, NORMAL_OPERATIONS)
        } else {
            write!(f, "{} risk - {}", self.level, self.factors.join("; "))
        }
    }
}

pub fn assess(sample: &Sample) -> RiskAssessment {
    let mut risk = RiskAssessment::new();

    let temp_c = sample.temperature_c();
    if temp_c > CRITICAL_HEAT_C {
        risk.add(RiskLevel::Critical, "Extreme heat may cause equipment failure");
    } else if temp_c > HIGH_HEAT_C {
        risk.add(RiskLevel::High, "High heat increases cooling system strain");
    } else if temp_c < SEVERE_COLD_C {
        risk.add(RiskLevel::High, "Extreme cold may affect facility operations");
    }

    if mentions_any(&sample.conditions, DESTRUCTIVE_KEYWORDS) {
        risk.add(
            RiskLevel::Critical,
            "Severe weather threatens physical infrastructure",
        );
    } else if mentions_any(&sample.conditions, STORM_KEYWORDS) {
        risk.add(RiskLevel::High, "Storms may cause power disruptions");
    } else if mentions_any(&sample.conditions, PRECIPITATION_KEYWORDS) {
        risk.add(RiskLevel::Medium, "Precipitation increases humidity concerns");
    }

    if sample.wind_speed > DAMAGING_WIND_MS {
        risk.add(RiskLevel::High, "High winds may damage cooling infrastructure");
    } else if sample.wind_speed > MODERATE_WIND_MS {
        risk.add(RiskLevel::Medium, "Moderate winds may affect cooling efficiency");
    }

    risk
}

pub fn risk_assessment(samples: &[Sample]) -> BTreeMap<String, RiskAssessment> {
    samples.iter().map(|s| (s.site.clone(), assess(s))).collect()
}
