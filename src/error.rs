use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("missing required columns in CSV: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("invalid weight configuration: {0}")]
    InvalidWeightConfiguration(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
