use crate::records::row::Row;

/// An ordered group of rows accumulated by exactly one worker between two
/// flushes. Never shared between workers.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: String,
    pub rows: Vec<Row>,
    /// When the first row of this batch was accumulated.
    pub ts: chrono::DateTime<chrono::Utc>,
}

impl Batch {
    pub fn new() -> Self {
        Batch {
            id: uuid::Uuid::new_v4().to_string(),
            rows: Vec::new(),
            ts: chrono::Utc::now(),
        }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_preserves_row_order() {
        let mut batch = Batch::new();
        for i in 0..5 {
            batch.push(Row::new(format!("r{i}"), json!({"seq": i})));
        }

        assert_eq!(batch.len(), 5);
        let ids: Vec<&str> = batch.rows.iter().map(|r| r.insert_id.as_str()).collect();
        assert_eq!(ids, vec!["r0", "r1", "r2", "r3", "r4"]);
    }

    #[test]
    fn test_new_batch_is_empty() {
        let batch = Batch::new();
        assert!(batch.is_empty());
        assert!(!batch.id.is_empty());
    }
}
