use crate::error::ConfigError;
use std::time::Duration;

/// Configuration applied uniformly to every worker in a group.
///
/// Fixed at construction; a running group never observes changes.
#[derive(Clone, Debug)]
pub struct StreamConfig {
    /// Number of background workers pulling from the shared intake queue.
    pub num_workers: usize,

    /// Max rows a worker accumulates before flushing to the endpoint.
    pub max_rows: usize,

    /// Max time between the first row of a batch and its flush.
    pub max_delay: Duration,

    /// Insert retries allowed per flush after the initial attempt.
    pub max_retries: usize,

    /// Sleep between consecutive insert attempts.
    pub retry_interval: Duration,

    /// Accept rows that contain values that do not match the remote schema.
    /// The unknown values are ignored.
    pub ignore_unknown_values: bool,

    /// Insert all valid rows of a request, even if invalid rows exist.
    pub skip_invalid_rows: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            num_workers: 10,
            max_rows: 500,
            max_delay: Duration::from_secs(5),
            max_retries: 10,
            retry_interval: Duration::from_secs(5),
            ignore_unknown_values: false,
            skip_invalid_rows: false,
        }
    }
}

impl StreamConfig {
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn with_ignore_unknown_values(mut self, ignore: bool) -> Self {
        self.ignore_unknown_values = ignore;
        self
    }

    pub fn with_skip_invalid_rows(mut self, skip: bool) -> Self {
        self.skip_invalid_rows = skip;
        self
    }

    /// Reject configurations the worker pool cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_workers == 0 {
            return Err(ConfigError::InvalidOption {
                option: "num_workers",
                reason: "must be greater than zero",
            });
        }
        if self.max_rows == 0 {
            return Err(ConfigError::InvalidOption {
                option: "max_rows",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    /// Capacity of the shared intake queue. Sized so that, under worst-case
    /// insert delay, no single worker keeps the others from pulling work that
    /// is already queued.
    pub fn intake_capacity(&self) -> usize {
        self.max_rows * self.num_workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = StreamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_workers, 10);
        assert_eq!(config.max_rows, 500);
        assert!(!config.ignore_unknown_values);
        assert!(!config.skip_invalid_rows);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = StreamConfig::default()
            .with_num_workers(0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOption {
                option: "num_workers",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_max_rows_rejected() {
        let err = StreamConfig::default()
            .with_max_rows(0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOption {
                option: "max_rows",
                ..
            }
        ));
    }

    #[test]
    fn test_intake_capacity_scales_with_pool() {
        let config = StreamConfig::default()
            .with_num_workers(4)
            .with_max_rows(25);
        assert_eq!(config.intake_capacity(), 100);
    }

    #[test]
    fn test_builders_chain() {
        let config = StreamConfig::default()
            .with_num_workers(2)
            .with_max_rows(3)
            .with_max_delay(Duration::from_millis(7))
            .with_max_retries(1)
            .with_retry_interval(Duration::from_millis(9))
            .with_ignore_unknown_values(true)
            .with_skip_invalid_rows(true);

        assert_eq!(config.num_workers, 2);
        assert_eq!(config.max_rows, 3);
        assert_eq!(config.max_delay, Duration::from_millis(7));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.retry_interval, Duration::from_millis(9));
        assert!(config.ignore_unknown_values);
        assert!(config.skip_invalid_rows);
    }
}
