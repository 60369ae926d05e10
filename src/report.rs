//! Text and JSON rendering of one monitoring cycle.

use std::fmt;

use analyzer::Analysis;
use chrono::{DateTime, SecondsFormat, Utc};
use common::{Result, Sample};
use serde::Serialize;

const RULE_WIDTH: usize = 80;

/// Everything a report shows for one cycle.
#[derive(Debug, Serialize)]
pub struct CycleReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub samples: &'a [Sample],
    pub analysis: &'a Analysis,
    pub failed_sites: Vec<String>,
}

impl CycleReport<'_> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CycleReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(f, "{heavy}")?;
        writeln!(
            f,
            "WEATHER IMPACT REPORT FOR DATA CENTERS - {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "{heavy}")?;

        writeln!(f, "\nCURRENT CONDITIONS:\n{light}")?;
        for s in self.samples {
            let observed = s
                .observed_at_utc()
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_else(|| s.observed_at.to_string());
            writeln!(f, "Location: {}", s.site)?;
            writeln!(f, "  Temperature: {:.1}°C", s.temperature_c())?;
            writeln!(f, "  Humidity: {:.0}%", s.humidity)?;
            writeln!(f, "  Wind Speed: {:.1} m/s", s.wind_speed)?;
            writeln!(f, "  Conditions: {}", s.conditions)?;
            writeln!(f, "  Observed: {}", observed)?;
        }
        if !self.failed_sites.is_empty() {
            writeln!(f, "Unavailable: {}", self.failed_sites.join(", "))?;
        }

        writeln!(f, "\nEXTREME CONDITIONS:\n{light}")?;
        if self.analysis.extreme_conditions.is_empty() {
            writeln!(f, "No extreme conditions detected.")?;
        }
        for (site, flags) in &self.analysis.extreme_conditions {
            let labels: Vec<&str> = flags.iter().map(|flag| flag.label()).collect();
            writeln!(f, "{}: {}", site, labels.join(", "))?;
        }

        writeln!(f, "\nESTIMATED DAILY COST IMPACT:\n{light}")?;
        for (site, cost) in &self.analysis.cost_impacts {
            writeln!(f, "{}: ${:.2}", site, cost)?;
        }
        writeln!(f, "Total: ${:.2}", self.analysis.total_cost_impact())?;

        writeln!(f, "\nRISK ASSESSMENT:\n{light}")?;
        for (site, risk) in &self.analysis.risk_assessments {
            writeln!(f, "{}: {}", site, risk)?;
        }
        writeln!(f, "{heavy}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn samples() -> Vec<Sample> {
        vec![
            Sample {
                site: "Asia-Tokyo".into(),
                temperature_k: 309.15,
                humidity: 85.0,
                wind_speed: 5.0,
                conditions: "Thunderstorm".into(),
                observed_at: 1_700_000_000,
            },
            Sample {
                site: "EU-West".into(),
                temperature_k: 288.0,
                humidity: 50.0,
                wind_speed: 3.0,
                conditions: "Clear".into(),
                observed_at: 1_700_000_000,
            },
        ]
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_text_report_sections() {
        let samples = samples();
        let analysis = analyzer::analyze(&samples);
        let report = CycleReport {
            generated_at: generated_at(),
            samples: &samples,
            analysis: &analysis,
            failed_sites: vec!["US-East".into()],
        };

        let text = report.to_text();

        assert!(text.contains("WEATHER IMPACT REPORT FOR DATA CENTERS - 2026-10-16 12:00:00"));
        assert!(text.contains("  Temperature: 36.0°C"));
        assert!(text.contains("Unavailable: US-East"));
        assert!(text.contains("Asia-Tokyo: Extreme heat, High humidity, Severe weather"));
        assert!(text.contains("EU-West: $50.00"));
        assert!(text.contains("Total: $612.50"));
        assert!(text.contains("EU-West: Low risk - Normal operating conditions"));
    }

    #[test]
    fn test_text_report_without_extremes() {
        let samples = vec![samples().remove(1)];
        let analysis = analyzer::analyze(&samples);
        let report = CycleReport {
            generated_at: generated_at(),
            samples: &samples,
            analysis: &analysis,
            failed_sites: Vec::new(),
        };

        let text = format!("{report}");

        assert_eq!(text, report.to_text());
        assert!(text.contains("No extreme conditions detected."));
        assert!(!text.contains("Unavailable:"));
        assert!(text.contains("Total: $50.00"));
        assert!(text.ends_with(&format!("{}\n", "=".repeat(RULE_WIDTH))));
    }

    #[test]
    fn test_json_report() {
        let samples = samples();
        let analysis = analyzer::analyze(&samples);
        let report = CycleReport {
            generated_at: generated_at(),
            samples: &samples,
            analysis: &analysis,
            failed_sites: Vec::new(),
        };

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json().expect("serializes")).expect("valid json");

        assert_eq!(json["samples"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["analysis"]["cost_impacts"]["EU-West"], 50.0);
        assert_eq!(
            json["analysis"]["extreme_conditions"]["Asia-Tokyo"][0],
            "Extreme heat"
        );
        assert_eq!(
            json["analysis"]["risk_assessments"]["Asia-Tokyo"]["level"],
            "High"
        );
    }
}
