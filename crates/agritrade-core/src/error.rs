use thiserror::Error;

use crate::types::RecordKind;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Month, day, or window length outside the calendar. Rejected before
    /// any ledger read; the caller corrects the request.
    #[error("Invalid period: {field}: {reason}")]
    InvalidPeriod { field: String, reason: String },

    /// The ledger collaborator could not return records for a requested
    /// range. The whole report call fails rather than returning partial
    /// or zeroed numbers.
    #[error("Ledger read failure for {kind} records: {detail}")]
    LedgerReadFailure { kind: RecordKind, detail: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}
