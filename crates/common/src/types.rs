//! Domain types shared across the workspace.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

// ── Sites ─────────────────────────────────────────────────────────────

/// A monitored data-center location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Human-readable name, unique within a run.
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Site {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}

// ── Samples ───────────────────────────────────────────────────────────

/// One observation of conditions at a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Name of the site this sample belongs to.
    pub site: String,
    /// Temperature in Kelvin.
    pub temperature_k: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Free-text condition description, e.g. "light rain".
    pub conditions: String,
    /// Observation time, epoch seconds.
    pub observed_at: i64,
}

impl Sample {
    pub fn temperature_c(&self) -> f64 {
        self.temperature_k - KELVIN_OFFSET
    }

    /// Cooling cost multiplier bucketed by Celsius temperature.
    pub fn cooling_cost_factor(&self) -> f64 {
        let temp_c = self.temperature_c();
        if temp_c <= 20.0 {
            0.5
        } else if temp_c <= 25.0 {
            1.0
        } else if temp_c <= 30.0 {
            1.5
        } else if temp_c <= 35.0 {
            2.0
        } else {
            3.0
        }
    }

    pub fn observed_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.observed_at, 0).single()
    }
}
