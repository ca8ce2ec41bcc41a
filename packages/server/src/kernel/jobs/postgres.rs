//! PostgreSQL-backed deferred task queue.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::queue::{TaskQueue, DEFAULT_LEASE_MS};
use super::task::{retry_delay, DeferredTask, TaskStatus};
use crate::common::{DriveId, TaskId};

const TASK_COLUMNS: &str = "id, drive_id, kind, run_at, status, attempt, max_attempts, \
     last_error, worker_id, lease_expires_at, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresTaskQueue {
    pool: PgPool,
    lease_ms: i64,
}

impl PostgresTaskQueue {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lease_ms: DEFAULT_LEASE_MS,
        }
    }

    /// Create with a custom lease duration.
    pub fn with_lease_duration(pool: PgPool, lease_ms: i64) -> Self {
        Self { pool, lease_ms }
    }

    async fn find(&self, task_id: TaskId) -> Result<DeferredTask> {
        sqlx::query_as::<_, DeferredTask>(&format!(
            "SELECT {} FROM deferred_tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(task_id)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("task {} not found", task_id))
    }
}

#[async_trait]
impl TaskQueue for PostgresTaskQueue {
    async fn schedule(&self, task: DeferredTask) -> Result<TaskId> {
        sqlx::query(
            r#"
            INSERT INTO deferred_tasks
                (id, drive_id, kind, run_at, status, attempt, max_attempts, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(task.id)
        .bind(task.drive_id)
        .bind(&task.kind)
        .bind(task.run_at)
        .bind(task.status)
        .bind(task.attempt)
        .bind(task.max_attempts)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .context("failed to insert deferred task")?;

        Ok(task.id)
    }

    async fn claim_due(
        &self,
        worker_id: &str,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<DeferredTask>> {
        let tasks = sqlx::query_as::<_, DeferredTask>(&format!(
            r#"
            WITH next_tasks AS (
                SELECT id
                FROM deferred_tasks
                WHERE
                    (status = 'pending' AND run_at <= $1)
                    OR (status = 'running' AND lease_expires_at < $1)
                ORDER BY run_at, created_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE deferred_tasks
            SET
                status = 'running',
                attempt = attempt + 1,
                worker_id = $3,
                lease_expires_at = $1 + ($4 || ' milliseconds')::INTERVAL,
                updated_at = $1
            WHERE id IN (SELECT id FROM next_tasks)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(now)
        .bind(limit)
        .bind(worker_id)
        .bind(self.lease_ms.to_string())
        .fetch_all(&self.pool)
        .await
        .context("failed to claim deferred tasks")?;

        Ok(tasks)
    }

    async fn mark_succeeded(&self, task_id: TaskId, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE deferred_tasks
            SET status = 'succeeded',
                lease_expires_at = NULL,
                updated_at = $1
            WHERE id = $2
            "#,
        )
        .bind(now)
        .bind(task_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(
        &self,
        task_id: TaskId,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<TaskStatus> {
        let task = self.find(task_id).await?;

        let (status, run_at) = if task.attempts_left() {
            (TaskStatus::Pending, now + retry_delay(task.attempt))
        } else {
            (TaskStatus::DeadLetter, task.run_at)
        };

        sqlx::query(
            r#"
            UPDATE deferred_tasks
            SET status = $1,
                run_at = $2,
                last_error = $3,
                lease_expires_at = NULL,
                updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(status)
        .bind(run_at)
        .bind(error)
        .bind(now)
        .bind(task_id)
        .execute(&self.pool)
        .await?;

        Ok(status)
    }

    async fn list_for_drive(&self, drive_id: DriveId) -> Result<Vec<DeferredTask>> {
        let tasks = sqlx::query_as::<_, DeferredTask>(&format!(
            "SELECT {} FROM deferred_tasks WHERE drive_id = $1 ORDER BY run_at, created_at",
            TASK_COLUMNS
        ))
        .bind(drive_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn next_run_time(&self) -> Result<Option<DateTime<Utc>>> {
        let next = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MIN(run_at) FROM deferred_tasks WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(next)
    }

    async fn prune_finished(&self, finished_before: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM deferred_tasks
            WHERE status IN ('succeeded', 'dead_letter')
              AND updated_at < $1
            "#,
        )
        .bind(finished_before)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
