//! Deferred work for drives: slot openings, break ends and feedback requests.

mod handler;

use std::sync::Arc;

use anyhow::Result;

use crate::kernel::jobs::{TaskRunSummary, TaskWorker, TaskWorkerConfig};
use crate::kernel::ServerDeps;

pub use handler::DriveTaskHandler;

/// Worker wired to the drive handler and the dependencies' queue and clock.
pub fn drive_task_worker(deps: &ServerDeps, config: TaskWorkerConfig) -> TaskWorker {
    TaskWorker::new(
        deps.tasks.clone(),
        Arc::new(DriveTaskHandler::new(deps.clone())),
        deps.clock.clone(),
        config,
    )
}

/// One pass over the tasks that are due now.
pub async fn run_due_tasks(deps: &ServerDeps, config: TaskWorkerConfig) -> Result<TaskRunSummary> {
    drive_task_worker(deps, config).run_once().await
}
