//! Durable deferred tasks.
//!
//! - [`DeferredTask`] - a timer bound to one drive, with retry bookkeeping
//! - [`TaskQueue`] - storage ([`InMemoryTaskQueue`], [`PostgresTaskQueue`])
//! - [`TaskWorker`] - claims due tasks and runs them through a [`TaskHandler`]
//!
//! What a task actually does lives in `domains::drives::jobs`. This module
//! only provides the infrastructure.

mod postgres;
mod queue;
mod task;
mod worker;

pub use postgres::PostgresTaskQueue;
pub use queue::{InMemoryTaskQueue, TaskQueue, DEFAULT_LEASE_MS};
pub use task::{retry_delay, DeferredTask, TaskKind, TaskStatus};
pub use worker::{
    TaskHandler, TaskRunSummary, TaskWorker, TaskWorkerConfig, DEFAULT_PRUNE_INTERVAL,
    DEFAULT_RETENTION,
};
