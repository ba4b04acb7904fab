//! Dispatcher - main worker loop

use crate::clients::{MessageQueue, Notifier, ObjectStore};
use crate::error::{MagicBucketError, Result};
use crate::model::{ObjectRef, ResultRef};
use crate::tasks::{CommandRunner, TaskRegistry};
use crate::worker::{QueueConsumer, WorkItemRunner, WorkerConfig};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What happened to a single queue item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The task ran and its output was uploaded
    Completed { task: String, result: ResultRef },
    /// No task is registered for the key's topmost segment
    UnknownTask { task_name: String },
    /// The task failed; the error was reported
    Failed { task: String, error: String },
}

/// Counts for one drain of the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub completed: usize,
    pub unknown: usize,
    pub failed: usize,
}

impl DispatchSummary {
    pub fn total(&self) -> usize {
        self.completed + self.unknown + self.failed
    }

    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Completed { .. } => self.completed += 1,
            ItemOutcome::UnknownTask { .. } => self.unknown += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Drains the queue, running the matching task for every object.
///
/// Task failures are reported and skipped. Anything else (queue, storage or
/// local I/O failures) is reported once and ends the loop with an error.
pub struct Dispatcher {
    queue: Option<Arc<dyn MessageQueue>>,
    notifier: Arc<dyn Notifier>,
    registry: TaskRegistry,
    runner: WorkItemRunner,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        store: Arc<dyn ObjectStore>,
        commands: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
        registry: TaskRegistry,
        config: WorkerConfig,
    ) -> Self {
        let mut dispatcher = Self::without_queue(store, commands, notifier, registry, config);
        dispatcher.queue = Some(queue);
        dispatcher
    }

    /// A dispatcher for single objects only; `run` fails without a queue
    pub fn without_queue(
        store: Arc<dyn ObjectStore>,
        commands: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
        registry: TaskRegistry,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue: None,
            notifier,
            registry,
            runner: WorkItemRunner::new(store, commands, config),
        }
    }

    /// Process every message currently on the queue, then return
    pub async fn run(&self) -> Result<DispatchSummary> {
        info!("Working directory: {}", self.runner.config().work_dir.display());

        match self.drain().await {
            Ok(summary) => {
                info!(
                    "Queue exhausted: {} completed, {} failed, {} unknown",
                    summary.completed, summary.failed, summary.unknown
                );
                Ok(summary)
            }
            Err(e) => Err(self.abort(e).await),
        }
    }

    /// Dispatch one object outside the queue loop.
    ///
    /// Errors that would abort the loop are reported the same way.
    pub async fn run_one(&self, object: &ObjectRef) -> Result<ItemOutcome> {
        match self.dispatch(object).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => Err(self.abort(e).await),
        }
    }

    async fn abort(&self, e: MagicBucketError) -> MagicBucketError {
        error!("Unhandled error, aborting: {}", e);
        self.notifier
            .fail(&format!("Unhandled exception, aborting: {}", e))
            .await;
        e
    }

    async fn drain(&self) -> Result<DispatchSummary> {
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| MagicBucketError::Config("No work queue configured".to_string()))?;
        info!("Starting magic-bucket dispatcher on {}", queue.url());
        let mut consumer = QueueConsumer::new(Arc::clone(queue));
        let mut summary = DispatchSummary::default();

        while let Some(object) = consumer.next_object().await? {
            info!("Received {}", object);
            let outcome = self.dispatch(&object).await?;
            summary.record(&outcome);
        }

        Ok(summary)
    }

    /// Run the task for one object and report the outcome.
    ///
    /// Only errors outside the item's own processing are returned.
    pub async fn dispatch(&self, object: &ObjectRef) -> Result<ItemOutcome> {
        let task = match self.registry.create(&object.key) {
            Ok(task) => task,
            Err(MagicBucketError::UnknownTask { task_name }) => {
                warn!("Unknown task {} for {}", task_name, object);
                self.notifier
                    .fail(&format!("Unknown task: *{}*", task_name))
                    .await;
                return Ok(ItemOutcome::UnknownTask { task_name });
            }
            Err(e) => return Err(e),
        };
        let name = task.name();

        self.notifier
            .info(&format!("Running *{}* on `{}`", name, object.key))
            .await;

        match self.runner.run(task.as_ref(), object).await {
            Ok(result) => {
                info!("Completed {} on {}, uploaded to {}", name, object.key, result);
                self.notifier
                    .success(&format!(
                        "Completed *{}* on `{}`, uploaded to s3://{}/{}",
                        name, object.key, result.bucket, result.key
                    ))
                    .await;
                Ok(ItemOutcome::Completed {
                    task: name.to_string(),
                    result,
                })
            }
            Err(e) if e.is_task_error() => {
                error!("{} failed on {}: {}", name, object.key, e);
                self.notifier
                    .fail(&format!(
                        "Error while running *{}* on *{}*: {}",
                        name, object.key, e
                    ))
                    .await;
                Ok(ItemOutcome::Failed {
                    task: name.to_string(),
                    error: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}
