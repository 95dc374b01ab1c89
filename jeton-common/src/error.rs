// ================================================================
// File: jeton-common/src/error.rs
// ================================================================

use thiserror::Error;
use uuid::Uuid;

use crate::models::threshold_rate::Frequency;

#[derive(Debug, Error)]
pub enum Error {
    // -------- Expected domain errors (surfaced to callers) --------
    #[error("No token found for code '{0}'")]
    TokenNotFound(String),

    #[error("Token '{0}' has already been used")]
    TokenAlreadyUsed(String),

    #[error("Token '{0}' has expired")]
    TokenExpired(String),

    #[error("No drawable prize available for pack {0}")]
    NoPrizeAvailable(Uuid),

    #[error("Draw could not complete after {0} attempts (concurrent stock depletion)")]
    DrawConflict(u32),

    #[error("Insufficient points: requested {requested}, available {available}")]
    InsufficientPoints { requested: i64, available: i64 },

    #[error("No {frequency} threshold rate configured for pack {pack_id}")]
    NoRateConfigured { pack_id: Uuid, frequency: Frequency },

    #[error("No winning ticket found for code '{0}'")]
    TicketNotFound(String),

    #[error("Ticket {0} has already been consumed")]
    TicketAlreadyConsumed(Uuid),

    #[error("Ticket {0} has expired")]
    TicketExpired(Uuid),

    #[error("Points already granted to user {user_id} for pack {pack_id} ({frequency} period starting {period_start})")]
    DuplicateGrant {
        user_id: Uuid,
        pack_id: Uuid,
        frequency: Frequency,
        period_start: chrono::DateTime<chrono::Utc>,
    },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // -------- Infrastructure failures (logged, never user-facing) --------
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the expected domain errors a caller is supposed to branch on;
    /// false for infrastructure failures that trigger rollback and logging.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            Error::Database(_) | Error::Migration(_) | Error::Json(_) | Error::Io(_)
        )
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}
