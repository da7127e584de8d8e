use std::time::Duration;
use tokio::time::sleep;

/// Indicates whether an error should be retried or treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Bounded fixed-interval retry budget for insert attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: usize,
    /// Sleep between consecutive attempts.
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            interval: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
        }
    }

    /// Whether another retry fits the budget after `used` retries.
    pub fn has_budget(&self, used: usize) -> bool {
        used < self.max_retries
    }

    /// Waits out the configured interval before the next attempt.
    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            sleep(self.interval).await;
        }
    }
}
