#![allow(dead_code)]

use async_trait::async_trait;
use model::records::row::Row;
use serde_json::json;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};
use stream_config::{credentials::Credentials, settings::StreamConfig};
use stream_core::{
    error::InsertError,
    inserter::{InsertOptions, InsertOutcome, Inserter, RowOutcome},
};
use stream_runtime::group::WorkerGroup;
use tracing::debug;

/// One scripted reply for a [`ScriptedInserter`] attempt.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Success,
    PerRow(Vec<RowOutcome>),
    Transient(&'static str),
    Fatal(&'static str),
}

/// Everything a fake inserter observed, shared with the test body.
#[derive(Debug, Default)]
pub struct InserterLog {
    /// `insert_id`s of each attempt, in call order.
    pub calls: Vec<Vec<String>>,
    /// Options seen on each attempt.
    pub options: Vec<InsertOptions>,
}

impl InserterLog {
    /// Ids across all attempts, flattened in call order.
    pub fn all_ids(&self) -> Vec<String> {
        self.calls.iter().flatten().cloned().collect()
    }
}

/// Replays a fixed script of outcomes and records every attempt. Once the
/// script is exhausted, every further attempt succeeds.
pub struct ScriptedInserter {
    script: VecDeque<ScriptedReply>,
    log: Arc<Mutex<InserterLog>>,
}

impl ScriptedInserter {
    pub fn new(
        script: impl IntoIterator<Item = ScriptedReply>,
        log: Arc<Mutex<InserterLog>>,
    ) -> Self {
        Self {
            script: script.into_iter().collect(),
            log,
        }
    }
}

#[async_trait]
impl Inserter for ScriptedInserter {
    async fn insert(
        &mut self,
        rows: &[Row],
        options: &InsertOptions,
    ) -> Result<InsertOutcome, InsertError> {
        debug!(rows = rows.len(), "Scripted insert attempt");
        {
            let mut log = self.log.lock().unwrap();
            log.calls
                .push(rows.iter().map(|r| r.insert_id.clone()).collect());
            log.options.push(*options);
        }

        match self.script.pop_front() {
            None | Some(ScriptedReply::Success) => Ok(InsertOutcome::Success),
            Some(ScriptedReply::PerRow(outcomes)) => Ok(InsertOutcome::PerRow(outcomes)),
            Some(ScriptedReply::Transient(msg)) => Err(InsertError::transient(msg)),
            Some(ScriptedReply::Fatal(msg)) => Err(InsertError::fatal(msg)),
        }
    }
}

/// Test rows with deterministic ids: `r0`, `r1`, ...
pub fn rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| Row::new(format!("r{i}"), json!({ "seq": i })))
        .collect()
}

pub fn test_credentials() -> Credentials {
    Credentials::from_key(r#"{"type":"service_account","private_key":"test"}"#)
}

/// Config tuned for fast tests: a single worker and tight timing.
pub fn quick_config() -> StreamConfig {
    StreamConfig::default()
        .with_num_workers(1)
        .with_max_rows(10)
        .with_max_delay(Duration::from_millis(20))
        .with_max_retries(2)
        .with_retry_interval(Duration::from_millis(5))
}

/// Builds a group whose workers replay the given scripts, one per worker.
/// Every worker shares the same observation log.
pub fn scripted_group(
    config: StreamConfig,
    scripts: Vec<Vec<ScriptedReply>>,
    log: &Arc<Mutex<InserterLog>>,
) -> WorkerGroup {
    assert_eq!(
        scripts.len(),
        config.num_workers,
        "one script per worker required"
    );

    let mut queue: VecDeque<Vec<ScriptedReply>> = scripts.into();
    let log = Arc::clone(log);
    let mut factory = move |_: &Credentials| -> Result<
        Box<dyn Inserter + Send>,
        Box<dyn std::error::Error + Send + Sync>,
    > {
        let script = queue.pop_front().expect("factory called too many times");
        Ok(Box::new(ScriptedInserter::new(script, Arc::clone(&log))))
    };

    WorkerGroup::new(&test_credentials(), config, &mut factory).expect("group construction")
}

/// Polls until `predicate` holds or the deadline passes; returns the final
/// predicate value.
pub async fn wait_for(deadline: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let limit = tokio::time::Instant::now() + deadline;
    while tokio::time::Instant::now() < limit {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    predicate()
}
