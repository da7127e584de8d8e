use crate::error::InsertError;
use async_trait::async_trait;
use model::records::row::Row;

/// Per-attempt options passed through unchanged to every insert call.
///
/// Both flags affect how the remote side classifies rows, not local control
/// flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Accept rows that contain values that do not match the remote schema;
    /// the unknown values are ignored.
    pub ignore_unknown_values: bool,

    /// Insert all valid rows of a request, even if invalid rows exist.
    pub skip_invalid_rows: bool,
}

/// Outcome of one bulk-insert attempt.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// Every submitted row was accepted.
    Success,

    /// Row-level classification, index-aligned with the submitted rows.
    /// A vector shorter than the submitted set counts the missing tail as
    /// accepted.
    PerRow(Vec<RowOutcome>),
}

/// Classification of a single row within an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted,

    /// The remote side will never accept this row; retrying cannot succeed.
    Rejected(String),

    /// The row may succeed on a later attempt.
    Retryable(String),
}

/// One remote bulk-insert attempt.
///
/// Implementations own authentication, transport, the wire format and the
/// mapping from remote responses into [`InsertOutcome`] / [`InsertError`].
/// The pipeline re-invokes `insert` with a shrinking subset of rows across
/// retries; implementations must not mutate or reorder the rows they are
/// given.
#[async_trait]
pub trait Inserter: Send {
    async fn insert(
        &mut self,
        rows: &[Row],
        options: &InsertOptions,
    ) -> Result<InsertOutcome, InsertError>;
}
