use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::error::ScoringError;
use crate::models::AccountRecord;

pub const REQUIRED_COLUMNS: [&str; 10] = [
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
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Positions of the required columns in the input header, in `REQUIRED_COLUMNS` order.
struct ColumnIndex([usize; 10]);

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, ScoringError> {
        let mut positions = [0usize; 10];
        let mut missing = Vec::new();

        for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            match headers.iter().position(|header| header.trim() == name) {
                Some(position) => *slot = position,
                None => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(Self(positions))
        } else {
            Err(ScoringError::MissingColumns(missing))
        }
    }

    fn cell<'r>(&self, row: &'r StringRecord, column: usize) -> Option<&'r str> {
        self.0
            .get(column)
            .and_then(|position| row.get(*position))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Default)]
struct CoercionStats {
    defaulted_cells: usize,
    invalid_dates: usize,
}

impl CoercionStats {
    fn number(&mut self, raw: Option<&str>, default: f64) -> f64 {
        match parse_number(raw) {
            Some(value) => value,
            None => {
                self.defaulted_cells += 1;
                default
            }
        }
    }

    fn date(&mut self, raw: Option<&str>) -> Option<NaiveDate> {
        let parsed = raw.and_then(parse_date);
        if parsed.is_none() {
            self.invalid_dates += 1;
        }
        parsed
    }
}

pub fn load_accounts_from_path(path: &Path) -> Result<Vec<AccountRecord>, ScoringError> {
    let file = std::fs::File::open(path)?;
    load_accounts(file)
}

/// Read and coerce an account table. Fails only on missing columns or unreadable CSV.
pub fn load_accounts<R: Read>(input: R) -> Result<Vec<AccountRecord>, ScoringError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input);
    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let mut stats = CoercionStats::default();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let text = |column: usize| columns.cell(&row, column).unwrap_or_default().to_string();

        let total_seats = stats.number(columns.cell(&row, 9), 1.0);
        records.push(AccountRecord {
            customer: text(0),
            segment: text(1),
            arr: stats.number(columns.cell(&row, 2), 0.0),
            renewal_date: stats.date(columns.cell(&row, 3)),
            nps: stats.number(columns.cell(&row, 4), 0.0),
            tickets_last_90d: stats.number(columns.cell(&row, 5), 0.0),
            csat: stats.number(columns.cell(&row, 6), 0.0),
            logins_last_30d: stats.number(columns.cell(&row, 7), 0.0),
            active_users: stats.number(columns.cell(&row, 8), 0.0),
            total_seats: if total_seats > 0.0 { total_seats } else { 1.0 },
        });
    }

    log::debug!(
        "loaded {} accounts ({} numeric cells defaulted)",
        records.len(),
        stats.defaulted_cells
    );
    if stats.invalid_dates > 0 {
        log::warn!(
            "{} accounts have a missing or unparsable Renewal_Date",
            stats.invalid_dates
        );
    }

    Ok(records)
}

/// Finite number or nothing.
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|value| value.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|value| value.date_naive())
        })
}
