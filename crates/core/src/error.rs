//! Error types for AOtD Core

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Rejected input; the message is shown to the user verbatim
    #[error("{0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Nobody can be picked for this date (empty pool or everyone blocked)
    #[error("No eligible submissions for {date}")]
    NoEligibleSubmissions { date: NaiveDate },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable category, used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::NoEligibleSubmissions { .. } => "no_eligible_submissions",
            Error::Database(_) | Error::Config(_) | Error::Io(_) | Error::Serialization(_) => {
                "internal"
            }
        }
    }

    /// Whether the caller caused this error (4xx-equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Forbidden(_) | Error::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
