use crate::records::row::Row;
use serde::{Deserialize, Serialize};

/// A row the pipeline will not attempt again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRow {
    pub row: Row,
    pub error: FailureError,
    /// Number of insert attempts the row went through before being given up.
    pub attempts: u32,
}

/// Why a row was given up on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote side will never accept this row (e.g. schema mismatch).
    Rejected,

    /// The row stayed retryable until the retry budget ran out.
    RetriesExhausted,

    /// A fatal call failure aborted the whole flush.
    Aborted,
}

/// Error information for a failed row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureError {
    pub kind: FailureKind,
    pub message: String,
}

impl FailedRow {
    pub fn new(row: Row, kind: FailureKind, message: impl Into<String>) -> Self {
        FailedRow {
            row,
            error: FailureError {
                kind,
                message: message.into(),
            },
            attempts: 1,
        }
    }

    /// Record how many insert attempts the row went through.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_row_creation() {
        let row = Row::new("r1", json!({"email": "not-an-email"}));
        let failed = FailedRow::new(row, FailureKind::Rejected, "invalid value for field email");

        assert_eq!(failed.error.kind, FailureKind::Rejected);
        assert_eq!(failed.error.message, "invalid value for field email");
        assert_eq!(failed.attempts, 1);
        assert_eq!(failed.row.insert_id, "r1");
    }

    #[test]
    fn test_failed_row_with_attempts() {
        let row = Row::new("r2", json!({}));
        let failed =
            FailedRow::new(row, FailureKind::RetriesExhausted, "connection reset").with_attempts(4);

        assert_eq!(failed.attempts, 4);
        assert_eq!(failed.error.kind, FailureKind::RetriesExhausted);
    }
}
