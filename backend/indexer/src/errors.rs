//! Error types for the indexer service.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] wakaf_protocol::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IndexerError {
    /// Numeric code reported to API clients; ledger codes pass through and
    /// everything else is `0`.
    pub fn code(&self) -> u32 {
        match self {
            IndexerError::Ledger(e) => e.code(),
            _ => 0,
        }
    }
}
