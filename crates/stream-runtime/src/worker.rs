use crate::retry::classify_insert_error;
use model::{
    failure::{
        failed_row::{FailedRow, FailureKind},
        report::InsertErrorReport,
    },
    records::{batch::Batch, row::Row},
};
use std::{sync::Arc, time::Duration};
use stream_config::settings::StreamConfig;
use stream_core::{
    inserter::{InsertOptions, InsertOutcome, Inserter, RowOutcome},
    retry::{RetryDisposition, RetryPolicy},
};
use tokio::{
    sync::{Mutex, mpsc},
    time::{Instant, sleep_until},
};
use tracing::{debug, error, info, warn};

/// Receiver end of the shared intake queue, competed over by all workers.
pub(crate) type SharedIntake = Arc<Mutex<mpsc::Receiver<Row>>>;

/// What ended a batch's accumulation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushTrigger {
    /// The batch reached `max_rows`.
    Size,
    /// `max_delay` elapsed since the batch's first row.
    Delay,
    /// The intake queue was closed and drained; this is the terminal flush.
    Close,
}

/// A single background worker: accumulates rows from the shared intake queue
/// into a private batch and drives its own inserter through the retry loop.
///
/// Workers share nothing but the two queues; the batch and the inserter are
/// private state.
pub struct BatchWorker {
    id: usize,
    intake: SharedIntake,
    report_tx: mpsc::Sender<InsertErrorReport>,
    inserter: Box<dyn Inserter + Send>,
    max_rows: usize,
    max_delay: Duration,
    options: InsertOptions,
    retry: RetryPolicy,
}

impl BatchWorker {
    pub(crate) fn new(
        id: usize,
        intake: SharedIntake,
        report_tx: mpsc::Sender<InsertErrorReport>,
        inserter: Box<dyn Inserter + Send>,
        config: &StreamConfig,
    ) -> Self {
        Self {
            id,
            intake,
            report_tx,
            inserter,
            max_rows: config.max_rows,
            max_delay: config.max_delay,
            options: InsertOptions {
                ignore_unknown_values: config.ignore_unknown_values,
                skip_invalid_rows: config.skip_invalid_rows,
            },
            retry: RetryPolicy::new(config.max_retries, config.retry_interval),
        }
    }

    /// Runs until the intake queue is closed and drained.
    pub(crate) async fn run(mut self) {
        debug!(worker_id = self.id, "Worker started");

        loop {
            // Block for the first row of the next batch. No deadline runs
            // while the batch is empty.
            let Some(row) = self.recv().await else {
                // Intake closed and drained; the terminal flush of an empty
                // batch is a no-op.
                break;
            };

            let mut batch = Batch::new();
            batch.push(row);
            let deadline = Instant::now() + self.max_delay;

            let trigger = self.accumulate(&mut batch, deadline).await;
            debug!(
                worker_id = self.id,
                batch_id = %batch.id,
                rows = batch.len(),
                trigger = ?trigger,
                "Batch ready"
            );

            self.flush(batch).await;

            if trigger == FlushTrigger::Close {
                break;
            }
        }

        debug!(worker_id = self.id, "Worker finished");
    }

    /// Receive one row, competing with the other workers for the queue.
    async fn recv(&mut self) -> Option<Row> {
        let mut rx = self.intake.lock().await;
        rx.recv().await
    }

    /// Fills the batch until it reaches `max_rows`, the deadline fires, or
    /// the intake queue closes, whichever comes first.
    async fn accumulate(&mut self, batch: &mut Batch, deadline: Instant) -> FlushTrigger {
        while batch.len() < self.max_rows {
            tokio::select! {
                _ = sleep_until(deadline) => return FlushTrigger::Delay,
                row = self.recv() => match row {
                    Some(row) => batch.push(row),
                    None => return FlushTrigger::Close,
                },
            }
        }
        FlushTrigger::Size
    }

    /// Drives the inserter until every row of the batch is resolved:
    /// accepted, permanently rejected, or out of retry budget.
    async fn flush(&mut self, batch: Batch) {
        if batch.is_empty() {
            return;
        }

        let batch_id = batch.id;
        let total = batch.rows.len();
        let age_ms = (chrono::Utc::now() - batch.ts).num_milliseconds();
        info!(
            worker_id = self.id,
            batch_id = %batch_id,
            rows = total,
            age_ms,
            "Flushing batch"
        );

        // Working set of still-unresolved rows; shrinks across attempts.
        let mut pending = batch.rows;
        let mut failed: Vec<FailedRow> = Vec::new();
        // Retries consumed by this flush; the initial attempt is free.
        let mut retries = 0usize;

        loop {
            let attempt = (retries + 1) as u32;

            match self.inserter.insert(&pending, &self.options).await {
                Ok(InsertOutcome::Success) => {
                    pending.clear();
                    break;
                }
                Ok(InsertOutcome::PerRow(outcomes)) => {
                    let (retryable, rejected) =
                        partition_outcomes(std::mem::take(&mut pending), outcomes, attempt);
                    failed.extend(rejected);
                    pending = retryable;

                    if pending.is_empty() {
                        break;
                    }
                    if !self.retry.has_budget(retries) {
                        warn!(
                            worker_id = self.id,
                            batch_id = %batch_id,
                            rows = pending.len(),
                            retries,
                            "Retry budget exhausted, reporting remaining rows"
                        );
                        failed.extend(fail_remaining(
                            std::mem::take(&mut pending),
                            FailureKind::RetriesExhausted,
                            "retry budget exhausted",
                            attempt,
                        ));
                        break;
                    }

                    retries += 1;
                    self.retry.pause().await;
                }
                Err(err) => match classify_insert_error(&err) {
                    RetryDisposition::Retry => {
                        if !self.retry.has_budget(retries) {
                            warn!(
                                worker_id = self.id,
                                batch_id = %batch_id,
                                error = %err,
                                retries,
                                "Retry budget exhausted, reporting batch"
                            );
                            failed.extend(fail_remaining(
                                std::mem::take(&mut pending),
                                FailureKind::RetriesExhausted,
                                &err.to_string(),
                                attempt,
                            ));
                            break;
                        }

                        debug!(
                            worker_id = self.id,
                            batch_id = %batch_id,
                            error = %err,
                            attempt,
                            "Transient insert failure, retrying"
                        );
                        retries += 1;
                        self.retry.pause().await;
                    }
                    RetryDisposition::Stop => {
                        error!(
                            worker_id = self.id,
                            batch_id = %batch_id,
                            error = %err,
                            "Fatal insert failure, aborting flush"
                        );
                        failed.extend(fail_remaining(
                            std::mem::take(&mut pending),
                            FailureKind::Aborted,
                            &err.to_string(),
                            attempt,
                        ));
                        break;
                    }
                },
            }
        }

        debug_assert!(pending.is_empty());

        if failed.is_empty() {
            info!(
                worker_id = self.id,
                batch_id = %batch_id,
                rows = total,
                "Batch delivered"
            );
        } else {
            self.report(InsertErrorReport::new(batch_id, self.id, failed));
        }
    }

    /// Push the report without blocking. A slow or absent consumer loses
    /// reports rather than stalling the pipeline.
    fn report(&self, report: InsertErrorReport) {
        match self.report_tx.try_send(report) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(report)) => {
                warn!(
                    worker_id = self.id,
                    batch_id = %report.batch_id,
                    rows = report.len(),
                    "Error report queue is full, dropping report"
                );
            }
            Err(mpsc::error::TrySendError::Closed(report)) => {
                warn!(
                    worker_id = self.id,
                    batch_id = %report.batch_id,
                    rows = report.len(),
                    "No error report consumer, dropping report"
                );
            }
        }
    }
}

/// Splits one attempt's working set: accepted rows leave, rejected rows
/// become failures, retryable rows stay pending. Outcomes are index-aligned
/// with the rows; a missing tail counts as accepted.
fn partition_outcomes(
    rows: Vec<Row>,
    outcomes: Vec<RowOutcome>,
    attempt: u32,
) -> (Vec<Row>, Vec<FailedRow>) {
    let mut retryable = Vec::new();
    let mut failed = Vec::new();

    let mut outcomes = outcomes.into_iter();
    for row in rows {
        match outcomes.next() {
            Some(RowOutcome::Accepted) | None => {}
            Some(RowOutcome::Rejected(reason)) => {
                failed.push(FailedRow::new(row, FailureKind::Rejected, reason).with_attempts(attempt));
            }
            Some(RowOutcome::Retryable(_)) => retryable.push(row),
        }
    }

    (retryable, failed)
}

/// Converts the still-unresolved working set into failures of one kind.
fn fail_remaining(
    rows: Vec<Row>,
    kind: FailureKind,
    message: &str,
    attempts: u32,
) -> Vec<FailedRow> {
    rows.into_iter()
        .map(|row| FailedRow::new(row, kind, message).with_attempts(attempts))
        .collect()
}
