//! Server dependencies for actions (using traits for testability)
//!
//! This module provides the central dependency container used by every drive
//! action and deferred task handler. All external services sit behind traits.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, RetryPolicy};
use crate::domains::drives::store::{DriveStore, InMemoryDriveStore, PostgresDriveStore};
use crate::kernel::jobs::{InMemoryTaskQueue, PostgresTaskQueue, TaskQueue};
use crate::kernel::{BaseClock, BaseNotifier, NotificationDispatcher, SystemClock};

/// Dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn DriveStore>,
    pub tasks: Arc<dyn TaskQueue>,
    /// Fire-and-forget notification gateway
    pub notifications: NotificationDispatcher,
    pub clock: Arc<dyn BaseClock>,
    /// Bounds the optimistic-concurrency retry loop
    pub retry: RetryPolicy,
    /// Attempts given to each deferred task before dead-lettering
    pub task_max_attempts: i32,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn DriveStore>,
        tasks: Arc<dyn TaskQueue>,
        notifications: NotificationDispatcher,
        clock: Arc<dyn BaseClock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            tasks,
            notifications,
            clock,
            retry,
            task_max_attempts: 3,
        }
    }

    pub fn with_task_max_attempts(mut self, max_attempts: i32) -> Self {
        self.task_max_attempts = max_attempts.max(1);
        self
    }

    /// Process-local stores; everything is lost on exit.
    pub fn in_memory(notifier: Arc<dyn BaseNotifier>, config: &Config) -> Self {
        Self::new(
            Arc::new(InMemoryDriveStore::new()),
            Arc::new(InMemoryTaskQueue::new()),
            NotificationDispatcher::new(notifier),
            Arc::new(SystemClock),
            config.retry_policy(),
        )
        .with_task_max_attempts(config.task_max_attempts)
    }

    pub fn postgres(pool: PgPool, notifier: Arc<dyn BaseNotifier>, config: &Config) -> Self {
        Self::new(
            Arc::new(PostgresDriveStore::new(pool.clone())),
            Arc::new(PostgresTaskQueue::new(pool)),
            NotificationDispatcher::new(notifier),
            Arc::new(SystemClock),
            config.retry_policy(),
        )
        .with_task_max_attempts(config.task_max_attempts)
    }

    /// Postgres when `DATABASE_URL` is set (migrations applied), memory otherwise.
    pub async fn from_config(config: &Config, notifier: Arc<dyn BaseNotifier>) -> Result<Self> {
        match &config.database_url {
            Some(url) => {
                let pool = connect(url).await?;
                Ok(Self::postgres(pool, notifier, config))
            }
            None => {
                info!("DATABASE_URL not set, using in-memory stores");
                Ok(Self::in_memory(notifier, config))
            }
        }
    }
}

/// Connects and applies pending migrations.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    info!("database connected, migrations applied");
    Ok(pool)
}
