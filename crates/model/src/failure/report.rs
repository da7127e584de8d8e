use crate::failure::failed_row::FailedRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The terminal, non-retryable result of one flush that produced failures:
/// permanently rejected rows and rows that exhausted the retry budget.
///
/// Emitted at most once per flush, never for a fully successful one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertErrorReport {
    pub id: String,
    /// The batch whose flush produced this report.
    pub batch_id: String,
    pub worker_id: usize,
    pub rows: Vec<FailedRow>,
    pub created_at: DateTime<Utc>,
}

impl InsertErrorReport {
    pub fn new(batch_id: impl Into<String>, worker_id: usize, rows: Vec<FailedRow>) -> Self {
        InsertErrorReport {
            id: uuid::Uuid::new_v4().to_string(),
            batch_id: batch_id.into(),
            worker_id,
            rows,
            created_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{failure::failed_row::FailureKind, records::row::Row};
    use serde_json::json;

    #[test]
    fn test_report_wraps_failed_rows() {
        let failed = vec![
            FailedRow::new(Row::new("a", json!({})), FailureKind::Rejected, "bad schema"),
            FailedRow::new(
                Row::new("b", json!({})),
                FailureKind::RetriesExhausted,
                "rate limited",
            ),
        ];

        let report = InsertErrorReport::new("batch-1", 3, failed);

        assert_eq!(report.len(), 2);
        assert!(!report.is_empty());
        assert_eq!(report.batch_id, "batch-1");
        assert_eq!(report.worker_id, 3);
        assert!(!report.id.is_empty());
    }
}
