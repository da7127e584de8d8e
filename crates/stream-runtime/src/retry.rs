use stream_core::{error::InsertError, retry::RetryDisposition};

/// Maps a call-level insert failure to a retry decision.
pub fn classify_insert_error(err: &InsertError) -> RetryDisposition {
    match err {
        InsertError::Transient { .. } => RetryDisposition::Retry,
        InsertError::Fatal { .. } => RetryDisposition::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_is_retried() {
        let err = InsertError::transient("connection reset by peer");
        assert_eq!(classify_insert_error(&err), RetryDisposition::Retry);
    }

    #[test]
    fn test_fatal_stops() {
        let err = InsertError::fatal("invalid credentials");
        assert_eq!(classify_insert_error(&err), RetryDisposition::Stop);
    }
}
