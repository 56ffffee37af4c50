use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// One coerced input row. Every numeric field is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub customer: String,
    pub segment: String,
    pub arr: f64,
    pub renewal_date: Option<NaiveDate>,
    pub nps: f64,
    pub tickets_last_90d: f64,
    pub csat: f64,
    pub logins_last_30d: f64,
    pub active_users: f64,
    pub total_seats: f64,
}

/// Per-metric normalized scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricScores {
    pub nps: f64,
    pub csat: f64,
    pub usage: f64,
    pub logins: f64,
    pub tickets: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HealthBand {
    Red,
    Yellow,
    Green,
}

impl HealthBand {
    /// Display order used by band summaries.
    pub const ALL: [HealthBand; 3] = [HealthBand::Green, HealthBand::Yellow, HealthBand::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthBand::Red => "Red",
            HealthBand::Yellow => "Yellow",
            HealthBand::Green => "Green",
        }
    }
}

impl fmt::Display for HealthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-level rating shared by expansion potential and renewal risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "Low",
            Level::Medium => "Medium",
            Level::High => "High",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch-level statistics gathered before any row is scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchStats {
    pub max_logins: f64,
    pub max_tickets: f64,
    pub median_tickets: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAccount {
    pub record: AccountRecord,
    pub usage_ratio: f64,
    pub scores: MetricScores,
    pub health_score: f64,
    pub health_band: HealthBand,
    pub days_to_renewal: Option<i64>,
    pub expansion_potential: Level,
    pub renewal_risk: Level,
    pub recommended_actions: Vec<&'static str>,
}

impl ScoredAccount {
    pub fn actions_display(&self) -> String {
        self.recommended_actions.join(ACTION_SEPARATOR)
    }
}

pub const ACTION_SEPARATOR: &str = " • ";

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub total_arr: f64,
    pub at_risk_arr: f64,
    pub near_term_renewal_arr: f64,
    pub red_accounts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandSummary {
    pub band: HealthBand,
    pub accounts: usize,
    pub arr: f64,
}
