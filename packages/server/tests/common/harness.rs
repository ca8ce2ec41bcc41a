//! Test harnesses for integration testing.
//!
//! `TestHarness` runs every action against in-memory stores with a settable
//! clock and a recording notifier. `PostgresHarness` uses a shared
//! testcontainers Postgres, started once and migrated once per test binary.

#![allow(dead_code)]

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use drive_core::domains::drives::jobs::run_due_tasks;
use drive_core::kernel::jobs::{TaskRunSummary, TaskWorkerConfig};
use drive_core::kernel::TestDependencies;
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use super::at;

fn init_tracing() {
    // Run tests with: RUST_LOG=debug cargo test -- --nocapture
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// In-memory harness
// =============================================================================

/// In-memory dependencies with the clock at 09:00 on the fixture day.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &mut TestHarness) {
///     let drive = create_drive(input, ctx.deps()).await.unwrap();
/// }
/// ```
pub struct TestHarness {
    pub test: TestDependencies,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        init_tracing();
        Self {
            test: TestDependencies::new(at(9, 0)),
        }
    }

    async fn teardown(self) {
        self.test.flush_notifications().await;
    }
}

impl TestHarness {
    pub fn deps(&self) -> &drive_core::kernel::ServerDeps {
        &self.test.deps
    }

    pub fn set_time(&self, now: DateTime<Utc>) {
        self.test.clock.set(now);
    }

    /// Runs every deferred task due at the current clock time.
    pub async fn run_due_tasks(&self) -> TaskRunSummary {
        run_due_tasks(&self.test.deps, TaskWorkerConfig::with_worker_id("test-worker"))
            .await
            .expect("task pass failed")
    }

    /// Waits for fire-and-forget notifications to be recorded.
    pub async fn settle(&self) {
        self.test.flush_notifications().await;
    }
}

// =============================================================================
// Postgres harness
// =============================================================================

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        init_tracing();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Fresh pool on the shared, migrated database.
pub struct PostgresHarness {
    pub db_pool: PgPool,
}

impl AsyncTestContext for PostgresHarness {
    async fn setup() -> Self {
        let infra = SharedTestInfra::get().await;
        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .expect("Failed to connect to test database");
        Self { db_pool }
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}
