//! Deferred task worker.
//!
//! The `TaskWorker` is a long-running loop that:
//! - Claims due tasks from a [`TaskQueue`]
//! - Runs them concurrently through a [`TaskHandler`]
//! - Marks each one succeeded, or failed for retry / dead-lettering
//! - Every `prune_interval`, deletes finished tasks older than `retention`
//!
//! A failing task only affects itself: its error is recorded on the task and
//! the rest of the batch carries on.
//!
//! # Architecture
//!
//! ```text
//! TaskWorker
//!     │
//!     ├─► claim_due(now, batch)        (TaskQueue)
//!     ├─► handler.handle(task)         (one future per task, joined)
//!     └─► mark_succeeded / mark_failed (TaskQueue)
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::queue::TaskQueue;
use super::task::{DeferredTask, TaskStatus};
use crate::kernel::BaseClock;

/// Configuration for the task worker.
#[derive(Debug, Clone)]
pub struct TaskWorkerConfig {
    /// Maximum number of tasks to claim at once
    pub batch_size: i64,
    /// How long to wait when no tasks are due
    pub poll_interval: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
    /// How long succeeded and dead-letter tasks are kept
    pub retention: Duration,
    /// How often the retention sweep runs
    pub prune_interval: Duration,
}

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 3600);
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(3600);

impl Default for TaskWorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            poll_interval: Duration::from_secs(1),
            worker_id: format!("worker-{}", Uuid::new_v4()),
            retention: DEFAULT_RETENTION,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}

impl TaskWorkerConfig {
    /// Create a new config with a specific worker ID.
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }
}

/// Executes one claimed task. Domain code provides the implementation.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &DeferredTask) -> Result<()>;
}

/// Counts from one pass over due tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskRunSummary {
    pub claimed: usize,
    pub succeeded: usize,
    pub retrying: usize,
    pub dead_lettered: usize,
}

pub struct TaskWorker {
    queue: Arc<dyn TaskQueue>,
    handler: Arc<dyn TaskHandler>,
    clock: Arc<dyn BaseClock>,
    config: TaskWorkerConfig,
}

enum TaskOutcome {
    Succeeded,
    Failed(TaskStatus),
    /// The queue itself errored while recording the result.
    Unrecorded,
}

impl TaskWorker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        handler: Arc<dyn TaskHandler>,
        clock: Arc<dyn BaseClock>,
        config: TaskWorkerConfig,
    ) -> Self {
        Self {
            queue,
            handler,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &TaskWorkerConfig {
        &self.config
    }

    /// Claims one batch of due tasks and runs it to completion.
    pub async fn run_once(&self) -> Result<TaskRunSummary> {
        let now = self.clock.now();
        let tasks = self
            .queue
            .claim_due(&self.config.worker_id, now, self.config.batch_size)
            .await?;

        let mut summary = TaskRunSummary {
            claimed: tasks.len(),
            ..Default::default()
        };
        if tasks.is_empty() {
            return Ok(summary);
        }
        debug!(count = tasks.len(), "claimed deferred tasks");

        let outcomes =
            futures::future::join_all(tasks.iter().map(|task| self.process_task(task))).await;

        for outcome in outcomes {
            match outcome {
                TaskOutcome::Succeeded => summary.succeeded += 1,
                TaskOutcome::Failed(TaskStatus::DeadLetter) => summary.dead_lettered += 1,
                TaskOutcome::Failed(_) | TaskOutcome::Unrecorded => summary.retrying += 1,
            }
        }

        Ok(summary)
    }

    /// Deletes finished tasks that fell out of the retention window.
    pub async fn prune(&self) -> Result<u64> {
        let retention = chrono::Duration::from_std(self.config.retention)
            .context("task retention out of range")?;
        let cutoff = self.clock.now() - retention;
        let pruned = self.queue.prune_finished(cutoff).await?;
        if pruned > 0 {
            info!(pruned, cutoff = %cutoff, "pruned finished deferred tasks");
        }
        Ok(pruned)
    }

    async fn process_task(&self, task: &DeferredTask) -> TaskOutcome {
        let task_id = task.id;
        let kind = task.kind().name();

        match self.handler.handle(task).await {
            Ok(()) => {
                debug!(task_id = %task_id, kind, drive_id = %task.drive_id, "task succeeded");
                match self.queue.mark_succeeded(task_id, self.clock.now()).await {
                    Ok(()) => TaskOutcome::Succeeded,
                    Err(e) => {
                        error!(task_id = %task_id, error = %e, "failed to mark task as succeeded");
                        TaskOutcome::Unrecorded
                    }
                }
            }
            Err(e) => {
                let error_msg = format!("{:#}", e);
                warn!(
                    task_id = %task_id,
                    kind,
                    drive_id = %task.drive_id,
                    attempt = task.attempt,
                    error = %error_msg,
                    "task failed"
                );
                match self
                    .queue
                    .mark_failed(task_id, &error_msg, self.clock.now())
                    .await
                {
                    Ok(status) => {
                        if status == TaskStatus::DeadLetter {
                            error!(task_id = %task_id, kind, "task moved to dead letter");
                        }
                        TaskOutcome::Failed(status)
                    }
                    Err(e) => {
                        error!(task_id = %task_id, error = %e, "failed to mark task as failed");
                        TaskOutcome::Unrecorded
                    }
                }
            }
        }
    }

    /// Polls until `shutdown` is cancelled. The batch in flight finishes first.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            "task worker starting"
        );

        let mut next_prune = tokio::time::Instant::now();
        loop {
            if shutdown.is_cancelled() {
                break;
            }

            if tokio::time::Instant::now() >= next_prune {
                if let Err(e) = self.prune().await {
                    warn!(error = %e, "failed to prune finished tasks");
                }
                next_prune = tokio::time::Instant::now() + self.config.prune_interval;
            }

            let summary = match self.run_once().await {
                Ok(summary) => summary,
                Err(e) => {
                    error!(error = %e, "failed to claim tasks");
                    TaskRunSummary::default()
                }
            };

            if summary.claimed > 0 {
                info!(
                    claimed = summary.claimed,
                    succeeded = summary.succeeded,
                    retrying = summary.retrying,
                    dead_lettered = summary.dead_lettered,
                    "processed deferred tasks"
                );
                continue;
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(worker_id = %self.config.worker_id, "task worker stopped");
        Ok(())
    }
}
