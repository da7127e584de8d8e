use thiserror::Error;

/// Call-level failure of one bulk-insert attempt.
///
/// Implementations of [`crate::inserter::Inserter`] own the mapping from
/// remote response codes into these two buckets; the pipeline only consumes
/// the classification.
#[derive(Error, Debug)]
pub enum InsertError {
    /// The whole attempt failed without per-row classification and may be
    /// retried (connectivity loss, rate limiting, 5xx responses).
    #[error("transient insert failure: {message}")]
    Transient { message: String },

    /// The attempt must not be retried regardless of remaining budget
    /// (invalid credentials, revoked access, malformed request).
    #[error("fatal insert failure: {message}")]
    Fatal { message: String },
}

impl InsertError {
    pub fn transient(message: impl Into<String>) -> Self {
        InsertError::Transient {
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        InsertError::Fatal {
            message: message.into(),
        }
    }
}
