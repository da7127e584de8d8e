use crate::{
    error::GroupError,
    worker::{BatchWorker, SharedIntake},
};
use futures::future::join_all;
use model::{failure::report::InsertErrorReport, records::row::Row};
use std::sync::Arc;
use stream_config::{credentials::Credentials, settings::StreamConfig};
use stream_core::inserter::Inserter;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tracing::{error, info};

/// Depth of the error-report queue. Reports beyond it are dropped, not
/// buffered unbounded.
const REPORT_QUEUE_DEPTH: usize = 64;

/// Factory invoked once per worker so that every worker owns a private
/// inserter. Tests inject fakes here, the way production code injects an
/// authenticated client.
pub type InserterFactory<'a> = dyn FnMut(
        &Credentials,
    ) -> Result<Box<dyn Inserter + Send>, Box<dyn std::error::Error + Send + Sync>>
    + 'a;

/// Owns the worker pool and the shared queues; the caller-facing surface of
/// the pipeline.
///
/// A group is constructed idle, started once, fed through [`Self::enqueue`]
/// and torn down with [`Self::close`], which drains and flushes everything
/// still queued. A closed group cannot be restarted; construct a new one.
pub struct WorkerGroup {
    workers: Vec<BatchWorker>,
    handles: Vec<JoinHandle<()>>,
    row_tx: mpsc::Sender<Row>,
    report_rx: Option<mpsc::Receiver<InsertErrorReport>>,
}

impl std::fmt::Debug for WorkerGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerGroup")
            .field("workers", &self.workers.len())
            .field("handles", &self.handles.len())
            .field("report_rx", &self.report_rx.is_some())
            .finish()
    }
}

impl WorkerGroup {
    /// Builds the pool: one inserter per worker via `make_inserter`, a shared
    /// intake queue sized `max_rows * num_workers`, and the bounded error
    /// report queue. Fails fast with no partial state on any error.
    pub fn new(
        credentials: &Credentials,
        config: StreamConfig,
        make_inserter: &mut InserterFactory<'_>,
    ) -> Result<Self, GroupError> {
        credentials.validate()?;
        config.validate()?;

        let (row_tx, row_rx) = mpsc::channel(config.intake_capacity());
        let (report_tx, report_rx) = mpsc::channel(REPORT_QUEUE_DEPTH);
        let intake: SharedIntake = Arc::new(Mutex::new(row_rx));

        let mut workers = Vec::with_capacity(config.num_workers);
        for worker_id in 0..config.num_workers {
            let inserter = make_inserter(credentials)
                .map_err(|source| GroupError::InserterInit { worker_id, source })?;
            workers.push(BatchWorker::new(
                worker_id,
                Arc::clone(&intake),
                report_tx.clone(),
                inserter,
                &config,
            ));
        }

        Ok(Self {
            workers,
            handles: Vec::new(),
            row_tx,
            report_rx: Some(report_rx),
        })
    }

    /// Launches all background workers. Errors after this point surface only
    /// through the error-report queue.
    pub fn start(&mut self) {
        let workers = std::mem::take(&mut self.workers);
        info!(workers = workers.len(), "Starting worker group");
        for worker in workers {
            self.handles.push(tokio::spawn(worker.run()));
        }
    }

    /// Appends a row to the shared intake queue, suspending while the queue
    /// is full (backpressure). No validation happens at this layer.
    pub async fn enqueue(&self, row: Row) -> Result<(), GroupError> {
        self.row_tx
            .send(row)
            .await
            .map_err(|_| GroupError::QueueClosed)
    }

    /// Takes the error-report consumer. Can be taken once; reports that no
    /// one consumes are dropped by the workers once the queue fills.
    pub fn error_reports(&mut self) -> Option<mpsc::Receiver<InsertErrorReport>> {
        self.report_rx.take()
    }

    /// Flushes and terminates the pool. Closing the intake queue lets every
    /// worker drain what is already queued, flush its final partial batch
    /// (even below both thresholds) and finish any in-flight retry loop
    /// before exiting; then all worker tasks are joined.
    pub async fn close(self) -> Result<(), GroupError> {
        let Self {
            workers,
            handles,
            row_tx,
            report_rx,
        } = self;

        // Dropping the sender closes the intake queue, which is the close
        // signal every worker honors after its current flush.
        drop(workers);
        drop(row_tx);

        info!(workers = handles.len(), "Closing worker group");
        let results = join_all(handles).await;
        // The report queue stays open until every final flush has finished.
        drop(report_rx);

        let mut first_err = None;
        for result in results {
            if let Err(err) = result {
                error!(error = %err, "Worker task failed during close");
                if first_err.is_none() {
                    first_err = Some(GroupError::WorkerPanic(err.to_string()));
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => {
                info!("Worker group closed");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stream_config::error::ConfigError;
    use stream_core::{
        error::InsertError,
        inserter::{InsertOptions, InsertOutcome},
    };

    struct NoopInserter;

    #[async_trait]
    impl Inserter for NoopInserter {
        async fn insert(
            &mut self,
            _rows: &[Row],
            _options: &InsertOptions,
        ) -> Result<InsertOutcome, InsertError> {
            Ok(InsertOutcome::Success)
        }
    }

    fn noop_factory() -> impl FnMut(
        &Credentials,
    ) -> Result<Box<dyn Inserter + Send>, Box<dyn std::error::Error + Send + Sync>>
    {
        |_| Ok(Box::new(NoopInserter) as Box<dyn Inserter + Send>)
    }

    #[test]
    fn test_construction_rejects_empty_credentials() {
        let err = WorkerGroup::new(
            &Credentials::from_key(""),
            StreamConfig::default(),
            &mut noop_factory(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            GroupError::Config(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn test_construction_rejects_invalid_config() {
        let err = WorkerGroup::new(
            &Credentials::from_key("key"),
            StreamConfig::default().with_num_workers(0),
            &mut noop_factory(),
        )
        .unwrap_err();

        assert!(matches!(err, GroupError::Config(_)));
    }

    #[test]
    fn test_factory_error_fails_construction() {
        let mut factory = |_: &Credentials| -> Result<
            Box<dyn Inserter + Send>,
            Box<dyn std::error::Error + Send + Sync>,
        > { Err("no client".into()) };
        let err = WorkerGroup::new(
            &Credentials::from_key("key"),
            StreamConfig::default(),
            &mut factory,
        )
        .unwrap_err();

        assert!(matches!(err, GroupError::InserterInit { worker_id: 0, .. }));
    }
}
