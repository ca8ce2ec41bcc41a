//! Deferred Task Worker
//!
//! Polls the task queue and runs slot-opening, break-over and feedback-due
//! tasks until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use drive_core::config::Config;
use drive_core::domains::drives::jobs::drive_task_worker;
use drive_core::kernel::{LoggingNotifier, ServerDeps};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,drive_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    if config.database_url.is_none() {
        tracing::warn!("no DATABASE_URL, tasks live in memory and die with this process");
    }

    let deps = ServerDeps::from_config(&config, Arc::new(LoggingNotifier)).await?;
    let worker = drive_task_worker(&deps, config.worker_config());

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
        }
        signal.cancel();
    });

    worker.run(shutdown).await?;

    deps.notifications.flush().await;
    tracing::info!("worker stopped");
    Ok(())
}
