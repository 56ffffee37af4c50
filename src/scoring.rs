//! Normalization, composite scoring and banding.
//!
//! Scoring runs in two passes: [`BatchStats::from_records`] gathers the
//! batch-relative figures (login and ticket maxima, ticket median), then each
//! record is scored against them. Nothing is cached between calls.

use chrono::NaiveDate;

use crate::error::ScoringError;
use crate::models::{AccountRecord, BatchStats, HealthBand, MetricScores, ScoredAccount};
use crate::risk;
use crate::weights::Weights;

/// Highest score still banded Red.
pub const RED_UPPER: f64 = 49.9;
/// Highest score still banded Yellow.
pub const YELLOW_UPPER: f64 = 74.9;

impl BatchStats {
    pub fn from_records(records: &[AccountRecord]) -> Self {
        let max_of = |field: fn(&AccountRecord) -> f64| {
            records.iter().map(field).fold(0.0_f64, f64::max)
        };

        Self {
            max_logins: max_of(|r| r.logins_last_30d),
            max_tickets: max_of(|r| r.tickets_last_90d),
            median_tickets: median(records.iter().map(|r| r.tickets_last_90d).collect()),
        }
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

pub fn usage_ratio(record: &AccountRecord) -> f64 {
    let seats = if record.total_seats > 0.0 {
        record.total_seats
    } else {
        1.0
    };
    (record.active_users / seats).clamp(0.0, 1.0)
}

/// `value / max`, or 0 when the batch has no positive maximum.
fn relative_to_max(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub fn metric_scores(record: &AccountRecord, usage_ratio: f64, stats: &BatchStats) -> MetricScores {
    MetricScores {
        nps: (record.nps.clamp(-100.0, 100.0) + 100.0) / 200.0,
        csat: record.csat.clamp(1.0, 5.0) / 5.0,
        usage: usage_ratio.clamp(0.0, 1.0),
        logins: relative_to_max(record.logins_last_30d, stats.max_logins),
        tickets: (1.0 - relative_to_max(record.tickets_last_90d, stats.max_tickets))
            .clamp(0.0, 1.0),
    }
}

/// Weighted mean of the metric scores on a 0-100 scale, one decimal.
/// `weights` must already be validated.
pub fn composite_score(scores: &MetricScores, weights: &Weights) -> f64 {
    let weights = weights.normalized();
    let weighted = scores.nps * weights.nps
        + scores.csat * weights.csat
        + scores.usage * weights.usage
        + scores.logins * weights.logins
        + scores.tickets * weights.tickets;
    round_one_decimal((weighted / weights.total() * 100.0).clamp(0.0, 100.0))
}

/// Half-to-even, so exact ties like 12.25 become 12.2.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

pub fn health_band(score: f64) -> HealthBand {
    if score <= RED_UPPER {
        HealthBand::Red
    } else if score <= YELLOW_UPPER {
        HealthBand::Yellow
    } else {
        HealthBand::Green
    }
}

pub fn days_to_renewal(renewal_date: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    renewal_date.map(|date| (date - today).num_days())
}

/// Run the whole pipeline over a batch. Fails before scoring anything when the
/// weights are unusable.
pub fn score_accounts(
    records: &[AccountRecord],
    weights: &Weights,
    today: NaiveDate,
) -> Result<Vec<ScoredAccount>, ScoringError> {
    weights.validate()?;

    let stats = BatchStats::from_records(records);
    log::debug!(
        "batch of {} accounts: max logins {}, max tickets {}, median tickets {:?}",
        records.len(),
        stats.max_logins,
        stats.max_tickets,
        stats.median_tickets
    );

    let accounts = records
        .iter()
        .map(|record| score_account(record, weights, &stats, today))
        .collect();
    Ok(accounts)
}

fn score_account(
    record: &AccountRecord,
    weights: &Weights,
    stats: &BatchStats,
    today: NaiveDate,
) -> ScoredAccount {
    let usage_ratio = usage_ratio(record);
    let scores = metric_scores(record, usage_ratio, stats);
    let health_score = composite_score(&scores, weights);
    let health_band = health_band(health_score);

    let mut account = ScoredAccount {
        record: record.clone(),
        usage_ratio,
        scores,
        health_score,
        health_band,
        days_to_renewal: days_to_renewal(record.renewal_date, today),
        expansion_potential: risk::expansion_potential(health_band, usage_ratio, record.nps),
        renewal_risk: risk::renewal_risk(health_band),
        recommended_actions: Vec::new(),
    };
    account.recommended_actions = risk::recommended_actions(&account, stats);
    account
}
