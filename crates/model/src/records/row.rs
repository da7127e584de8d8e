use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single unit of data queued for bulk insertion.
///
/// The payload is opaque to the pipeline. `insert_id` correlates the row with
/// per-row outcomes after an insert attempt and lets the remote side perform
/// best-effort deduplication across retries of the same row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub insert_id: String,
    pub data: Value,
}

impl Row {
    pub fn new(insert_id: impl Into<String>, data: Value) -> Self {
        Row {
            insert_id: insert_id.into(),
            data,
        }
    }

    /// Build a row with a freshly generated insert id.
    pub fn with_generated_id(data: Value) -> Self {
        Row {
            insert_id: uuid::Uuid::new_v4().to_string(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Row::with_generated_id(json!({"k": 1}));
        let b = Row::with_generated_id(json!({"k": 1}));

        assert!(!a.insert_id.is_empty());
        assert_ne!(a.insert_id, b.insert_id);
    }
}
