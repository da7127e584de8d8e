use stream_config::error::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build inserter for worker {worker_id}: {source}")]
    InserterInit {
        worker_id: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("the intake queue is closed")]
    QueueClosed,

    #[error("worker task failed: {0}")]
    WorkerPanic(String),
}
