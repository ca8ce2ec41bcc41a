//! Deferred task queue.
//!
//! Tasks are durable timers: they sit `pending` until `run_at`, get claimed by
//! one worker, and end `succeeded` or, after their attempts run out,
//! `dead_letter`. Failed attempts go back to `pending` with exponential backoff.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::task::{retry_delay, DeferredTask, TaskStatus};
use crate::common::{DriveId, TaskId};

/// Default time a claimed task may run before another worker may take it.
pub const DEFAULT_LEASE_MS: i64 = 300_000;

/// Trait for deferred task storage.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Persist a new pending task.
    async fn schedule(&self, task: DeferredTask) -> Result<TaskId>;

    /// Claim up to `limit` tasks that are due at `now`, oldest `run_at` first.
    ///
    /// Tasks whose lease expired while running are claimed again.
    async fn claim_due(
        &self,
        worker_id: &str,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<DeferredTask>>;

    /// Mark a task as successfully completed.
    async fn mark_succeeded(&self, task_id: TaskId, now: DateTime<Utc>) -> Result<()>;

    /// Record a failed attempt. Returns the resulting status: `Pending` when a
    /// retry was scheduled, `DeadLetter` otherwise.
    async fn mark_failed(
        &self,
        task_id: TaskId,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<TaskStatus>;

    /// Every task armed for a drive, in `run_at` order.
    async fn list_for_drive(&self, drive_id: DriveId) -> Result<Vec<DeferredTask>>;

    /// Earliest pending `run_at` (for sleep optimization).
    async fn next_run_time(&self) -> Result<Option<DateTime<Utc>>>;

    /// Delete succeeded and dead-letter tasks last touched before
    /// `finished_before`. Returns how many were removed.
    async fn prune_finished(&self, finished_before: DateTime<Utc>) -> Result<u64>;
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// Single-process queue for tests and database-less runs.
pub struct InMemoryTaskQueue {
    tasks: Mutex<HashMap<TaskId, DeferredTask>>,
    lease: Duration,
}

impl Default for InMemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn poison_err<T>(_: PoisonError<T>) -> anyhow::Error {
    anyhow!("task queue lock poisoned")
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            lease: Duration::milliseconds(DEFAULT_LEASE_MS),
        }
    }

    /// Snapshot of every task, in `run_at` order.
    pub fn all(&self) -> Result<Vec<DeferredTask>> {
        let tasks = self.tasks.lock().map_err(poison_err)?;
        let mut all: Vec<DeferredTask> = tasks.values().cloned().collect();
        all.sort_by_key(|t| (t.run_at, t.created_at));
        Ok(all)
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn schedule(&self, task: DeferredTask) -> Result<TaskId> {
        let id = task.id;
        self.tasks.lock().map_err(poison_err)?.insert(id, task);
        Ok(id)
    }

    async fn claim_due(
        &self,
        worker_id: &str,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<DeferredTask>> {
        let mut tasks = self.tasks.lock().map_err(poison_err)?;

        let mut due: Vec<&mut DeferredTask> = tasks
            .values_mut()
            .filter(|t| t.is_due(now) || t.is_abandoned(now))
            .collect();
        due.sort_by_key(|t| (t.run_at, t.created_at));

        let limit = usize::try_from(limit).unwrap_or(0);
        let claimed = due
            .into_iter()
            .take(limit)
            .map(|task| {
                task.status = TaskStatus::Running;
                task.attempt += 1;
                task.worker_id = Some(worker_id.to_string());
                task.lease_expires_at = Some(now + self.lease);
                task.updated_at = now;
                task.clone()
            })
            .collect();

        Ok(claimed)
    }

    async fn mark_succeeded(&self, task_id: TaskId, now: DateTime<Utc>) -> Result<()> {
        let mut tasks = self.tasks.lock().map_err(poison_err)?;
        let task = tasks
            .get_mut(&task_id)
            .ok_or_else(|| anyhow!("task {} not found", task_id))?;
        task.status = TaskStatus::Succeeded;
        task.lease_expires_at = None;
        task.updated_at = now;
        Ok(())
    }

    async fn mark_failed(
        &self,
        task_id: TaskId,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<TaskStatus> {
        let mut tasks = self.tasks.lock().map_err(poison_err)?;
        let task = tasks
            .get_mut(&task_id)
            .ok_or_else(|| anyhow!("task {} not found", task_id))?;

        task.last_error = Some(error.to_string());
        task.lease_expires_at = None;
        task.updated_at = now;
        if task.attempts_left() {
            task.status = TaskStatus::Pending;
            task.run_at = now + retry_delay(task.attempt);
        } else {
            task.status = TaskStatus::DeadLetter;
        }
        Ok(task.status)
    }

    async fn list_for_drive(&self, drive_id: DriveId) -> Result<Vec<DeferredTask>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|t| t.drive_id == drive_id)
            .collect())
    }

    async fn next_run_time(&self) -> Result<Option<DateTime<Utc>>> {
        let tasks = self.tasks.lock().map_err(poison_err)?;
        Ok(tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| t.run_at)
            .min())
    }

    async fn prune_finished(&self, finished_before: DateTime<Utc>) -> Result<u64> {
        let mut tasks = self.tasks.lock().map_err(poison_err)?;
        let before = tasks.len();
        tasks.retain(|_, t| !(t.status.is_finished() && t.updated_at < finished_before));
        Ok((before - tasks.len()) as u64)
    }
}
