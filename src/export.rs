use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ScoringError;
use crate::models::{HealthBand, Level, ScoredAccount};

/// Flat row of the enriched table: input columns first, then derived ones.
#[derive(Debug, Serialize)]
pub struct EnrichedRow<'a> {
    #[serde(rename = "Customer")]
    pub customer: &'a str,
    #[serde(rename = "Segment")]
    pub segment: &'a str,
    #[serde(rename = "ARR")]
    pub arr: f64,
    #[serde(rename = "Renewal_Date")]
    pub renewal_date: Option<NaiveDate>,
    #[serde(rename = "NPS")]
    pub nps: f64,
    #[serde(rename = "Tickets_Last_90d")]
    pub tickets_last_90d: f64,
    #[serde(rename = "CSAT")]
    pub csat: f64,
    #[serde(rename = "Logins_Last_30d")]
    pub logins_last_30d: f64,
    #[serde(rename = "Active_Users")]
    pub active_users: f64,
    #[serde(rename = "Total_Seats")]
    pub total_seats: f64,
    #[serde(rename = "Usage_Ratio")]
    pub usage_ratio: f64,
    pub score_nps: f64,
    pub score_csat: f64,
    pub score_usage: f64,
    pub score_logins: f64,
    pub score_tickets: f64,
    #[serde(rename = "Health_Score")]
    pub health_score: f64,
    #[serde(rename = "Health_Band")]
    pub health_band: HealthBand,
    #[serde(rename = "Days_to_Renewal")]
    pub days_to_renewal: Option<i64>,
    #[serde(rename = "Expansion_Potential")]
    pub expansion_potential: Level,
    #[serde(rename = "Renewal_Risk")]
    pub renewal_risk: Level,
    #[serde(rename = "Recommended_Actions")]
    pub recommended_actions: String,
}

impl<'a> From<&'a ScoredAccount> for EnrichedRow<'a> {
    fn from(account: &'a ScoredAccount) -> Self {
        let record = &account.record;
        Self {
            customer: &record.customer,
            segment: &record.segment,
            arr: record.arr,
            renewal_date: record.renewal_date,
            nps: record.nps,
            tickets_last_90d: record.tickets_last_90d,
            csat: record.csat,
            logins_last_30d: record.logins_last_30d,
            active_users: record.active_users,
            total_seats: record.total_seats,
            usage_ratio: account.usage_ratio,
            score_nps: account.scores.nps,
            score_csat: account.scores.csat,
            score_usage: account.scores.usage,
            score_logins: account.scores.logins,
            score_tickets: account.scores.tickets,
            health_score: account.health_score,
            health_band: account.health_band,
            days_to_renewal: account.days_to_renewal,
            expansion_potential: account.expansion_potential,
            renewal_risk: account.renewal_risk,
            recommended_actions: account.actions_display(),
        }
    }
}

/// Header of the enriched table, matching the serialized `EnrichedRow` fields.
pub const ENRICHED_COLUMNS: [&str; 22] = [
    "Customer",
    "Segment",
    "ARR",
    "Renewal_Date",
    "NPS",
    "Tickets_Last_90d",
    "CSAT",
    "Logins_Last_30d",
    "Active_Users",
    "Total_Seats",
    "Usage_Ratio",
    "score_nps",
    "score_csat",
    "score_usage",
    "score_logins",
    "score_tickets",
    "Health_Score",
    "Health_Band",
    "Days_to_Renewal",
    "Expansion_Potential",
    "Renewal_Risk",
    "Recommended_Actions",
];

pub fn write_csv<W: Write>(accounts: &[ScoredAccount], out: W) -> Result<(), ScoringError> {
    let mut writer = csv::Writer::from_writer(out);
    // serialize() only emits the header alongside the first row
    if accounts.is_empty() {
        writer.write_record(ENRICHED_COLUMNS)?;
    }
    for account in accounts {
        writer.serialize(EnrichedRow::from(account))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(accounts: &[ScoredAccount], mut out: W) -> Result<(), ScoringError> {
    let rows: Vec<EnrichedRow> = accounts.iter().map(EnrichedRow::from).collect();
    serde_json::to_writer_pretty(&mut out, &rows).map_err(std::io::Error::from)?;
    out.flush()?;
    Ok(())
}

pub fn export_to_path(
    accounts: &[ScoredAccount],
    path: &Path,
    json: bool,
) -> Result<(), ScoringError> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    if json {
        write_json(accounts, file)
    } else {
        write_csv(accounts, file)
    }
}
