use thiserror::Error;

/// Errors raised while ingesting tables or scoring candidates
#[derive(Debug, Error)]
pub enum RerankError {
    /// A required column is absent from an input table header
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: &'static str, column: &'static str },

    /// A cell could not be parsed into the type its column requires
    #[error("{table} table, row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        table: &'static str,
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Candidate id seen more than once while duplicates are rejected
    #[error("duplicate candidate id '{0}'")]
    DuplicateCandidate(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RerankError>;
