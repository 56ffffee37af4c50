use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// Relative importance of each normalized metric in the composite score.
///
/// A weights file must name all five metrics:
/// ```json
/// { "nps": 3, "csat": 2, "usage": 3, "logins": 1, "tickets": 2 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Weights {
    pub nps: f64,
    pub csat: f64,
    pub usage: f64,
    pub logins: f64,
    pub tickets: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            nps: 3.0,
            csat: 2.0,
            usage: 3.0,
            logins: 1.0,
            tickets: 2.0,
        }
    }
}

/// Per-metric overrides applied on top of a base configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightOverrides {
    pub nps: Option<f64>,
    pub csat: Option<f64>,
    pub usage: Option<f64>,
    pub logins: Option<f64>,
    pub tickets: Option<f64>,
}

impl Weights {
    pub fn from_json(json: &str) -> Result<Self, ScoringError> {
        serde_json::from_str(json)
            .map_err(|e| ScoringError::InvalidWeightConfiguration(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, ScoringError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_overrides(self, overrides: WeightOverrides) -> Self {
        Self {
            nps: overrides.nps.unwrap_or(self.nps),
            csat: overrides.csat.unwrap_or(self.csat),
            usage: overrides.usage.unwrap_or(self.usage),
            logins: overrides.logins.unwrap_or(self.logins),
            tickets: overrides.tickets.unwrap_or(self.tickets),
        }
    }

    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("nps", self.nps),
            ("csat", self.csat),
            ("usage", self.usage),
            ("logins", self.logins),
            ("tickets", self.tickets),
        ]
    }

    pub fn total(&self) -> f64 {
        self.entries().iter().map(|(_, weight)| weight).sum()
    }

    /// Same proportions with the largest weight scaled to 1, so sums stay finite
    /// for arbitrarily large valid weights.
    pub fn normalized(&self) -> Self {
        let max = self
            .entries()
            .iter()
            .map(|(_, weight)| *weight)
            .fold(0.0_f64, f64::max);
        if max > 0.0 {
            Self {
                nps: self.nps / max,
                csat: self.csat / max,
                usage: self.usage / max,
                logins: self.logins / max,
                tickets: self.tickets / max,
            }
        } else {
            *self
        }
    }

    /// Every weight must be finite and non-negative, and the sum positive.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let invalid: Vec<String> = self
            .entries()
            .iter()
            .filter(|(_, weight)| !weight.is_finite() || *weight < 0.0)
            .map(|(name, weight)| format!("{name}={weight}"))
            .collect();

        if !invalid.is_empty() {
            return Err(ScoringError::InvalidWeightConfiguration(format!(
                "weights must be finite and non-negative ({})",
                invalid.join(", ")
            )));
        }

        if self.total() <= 0.0 {
            return Err(ScoringError::InvalidWeightConfiguration(
                "weights must sum to a positive number".to_string(),
            ));
        }

        Ok(())
    }
}
