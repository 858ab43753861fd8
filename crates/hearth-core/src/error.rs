use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Invalid metadata")]
    Metadata(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Ambiguous short ID. Did you mean one of these?")]
    AmbiguousId(Vec<(String, String)>), // Vec of (ID, Title)

    /// Another writer already materialized this occurrence. Safe to ignore.
    #[error("Pattern {pattern_id} already has an instance on {occurrence_date}")]
    DuplicateOccurrence {
        pattern_id: Uuid,
        occurrence_date: NaiveDate,
    },
}

impl CoreError {
    pub fn is_duplicate_occurrence(&self) -> bool {
        matches!(self, CoreError::DuplicateOccurrence { .. })
    }
}
