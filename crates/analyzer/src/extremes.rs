//! Extreme-condition flags per site.

use std::collections::BTreeMap;
use std::fmt;

use common::Sample;
use serde::{Serialize, Serializer};

use crate::{mentions_any, PRECIPITATION_KEYWORDS, SEVERE_KEYWORDS};

const HEAT_C: f64 = 35.0;
const COLD_C: f64 = 0.0;
const HIGH_HUMIDITY: f64 = 80.0;
const LOW_HUMIDITY: f64 = 20.0;
const HIGH_WIND_MS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionFlag {
    ExtremeHeat,
    ExtremeCold,
    HighHumidity,
    LowHumidity,
    HighWinds,
    SevereWeather,
    Precipitation,
}

impl ConditionFlag {
    pub fn label(self) -> &'static str {
        match self {
            ConditionFlag::ExtremeHeat => "Extreme heat",
            ConditionFlag::ExtremeCold => "Extreme cold",
            ConditionFlag::HighHumidity => "High humidity",
            ConditionFlag::LowHumidity => "Low humidity",
            ConditionFlag::HighWinds => "High winds",
            ConditionFlag::SevereWeather => "Severe weather",
            ConditionFlag::Precipitation => "Precipitation",
        }
    }
}

impl fmt::Display for ConditionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ConditionFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Flags raised by one sample, in check order.
pub fn flags_for(sample: &Sample) -> Vec<ConditionFlag> {
    let mut flags = Vec::new();

    let temp_c = sample.temperature_c();
    if temp_c > HEAT_C {
        flags.push(ConditionFlag::ExtremeHeat);
    } else if temp_c < COLD_C {
        flags.push(ConditionFlag::ExtremeCold);
    }

    if sample.humidity > HIGH_HUMIDITY {
        flags.push(ConditionFlag::HighHumidity);
    } else if sample.humidity < LOW_HUMIDITY {
        flags.push(ConditionFlag::LowHumidity);
    }

    if sample.wind_speed > HIGH_WIND_MS {
        flags.push(ConditionFlag::HighWinds);
    }

    if mentions_any(&sample.conditions, SEVERE_KEYWORDS) {
        flags.push(ConditionFlag::SevereWeather);
    } else if mentions_any(&sample.conditions, PRECIPITATION_KEYWORDS) {
        flags.push(ConditionFlag::Precipitation);
    }

    flags
}

/// Sites with at least one flag, mapped to their flags.
pub fn extreme_conditions(samples: &[Sample]) -> BTreeMap<String, Vec<ConditionFlag>> {
    samples
        .iter()
        .filter_map(|s| {
            let flags = flags_for(s);
            (!flags.is_empty()).then(|| (s.site.clone(), flags))
        })
        .collect()
}
