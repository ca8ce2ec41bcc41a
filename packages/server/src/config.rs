use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::kernel::jobs::{TaskWorkerConfig, DEFAULT_PRUNE_INTERVAL};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it everything runs in memory.
    pub database_url: Option<String>,
    pub save_max_attempts: u32,
    pub save_backoff_ms: u64,
    pub task_poll_interval_ms: u64,
    pub task_batch_size: i64,
    pub task_max_attempts: i32,
    pub task_retention_hours: u64,
    pub worker_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            save_max_attempts: 3,
            save_backoff_ms: 100,
            task_poll_interval_ms: 1000,
            task_batch_size: 10,
            task_max_attempts: 3,
            task_retention_hours: 7 * 24,
            worker_id: format!("worker-{}", uuid::Uuid::new_v4()),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Self::default();
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            save_max_attempts: parse_var("DRIVE_SAVE_MAX_ATTEMPTS", defaults.save_max_attempts)?,
            save_backoff_ms: parse_var("DRIVE_SAVE_BACKOFF_MS", defaults.save_backoff_ms)?,
            task_poll_interval_ms: parse_var(
                "TASK_POLL_INTERVAL_MS",
                defaults.task_poll_interval_ms,
            )?,
            task_batch_size: parse_var("TASK_BATCH_SIZE", defaults.task_batch_size)?,
            task_max_attempts: parse_var("TASK_MAX_ATTEMPTS", defaults.task_max_attempts)?,
            task_retention_hours: parse_var(
                "TASK_RETENTION_HOURS",
                defaults.task_retention_hours,
            )?,
            worker_id: env::var("WORKER_ID").unwrap_or(defaults.worker_id),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.save_max_attempts.max(1),
            base_backoff: Duration::from_millis(self.save_backoff_ms),
        }
    }

    pub fn worker_config(&self) -> TaskWorkerConfig {
        TaskWorkerConfig {
            batch_size: self.task_batch_size,
            poll_interval: Duration::from_millis(self.task_poll_interval_ms),
            worker_id: self.worker_id.clone(),
            retention: Duration::from_secs(self.task_retention_hours * 3600),
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}

/// Bounds the read-modify-write retry loop around drive saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// No sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_backoff: Duration::ZERO,
        }
    }

    /// Delay after the `attempt`-th failed save (1-based): base * 2^(attempt-1).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1 << exponent)
    }
}
