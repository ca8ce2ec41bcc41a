//! Operator CLI for interview drives
//!
//! Every public drive operation as a subcommand. Results are printed as JSON.
//! Without DATABASE_URL the stores are in-memory and vanish when the command
//! exits, so anything beyond `create` needs Postgres.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drive_core::common::{DriveId, EventId};
use drive_core::config::Config;
use drive_core::domains::drives::actions::{
    create_drive, get_drive, get_stats, list_drives, record_event_outcome,
    respond_to_notification, trigger_scheduling, EventOutcome, NotificationResponse,
};
use drive_core::domains::drives::jobs::run_due_tasks;
use drive_core::domains::drives::models::{Decision, EventStatus, NewDrive};
use drive_core::kernel::{LoggingNotifier, ServerDeps};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "drive_cli")]
#[command(about = "Create and drive interview drives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a drive from a JSON file and run the first scheduling pass
    Create {
        #[arg(long)]
        file: PathBuf,
    },

    /// Show one drive
    Get { drive_id: DriveId },

    /// List drives, newest first
    List,

    /// Refresh statuses and run one scheduling pass
    Schedule { drive_id: DriveId },

    /// Record an update for one event
    Outcome {
        drive_id: DriveId,
        event_id: EventId,
        /// SCHEDULED, ONGOING or COMPLETED
        #[arg(long)]
        status: Option<String>,
        /// STRONG_NO, NO, YES or STRONG_YES
        #[arg(long)]
        decision: Option<String>,
        #[arg(long)]
        question: Option<String>,
        #[arg(long)]
        ready_for_next: Option<bool>,
        #[arg(long)]
        break_minutes: Option<u32>,
    },

    /// Apply a participant's reply to a notification (JSON file)
    Respond {
        drive_id: DriveId,
        #[arg(long)]
        file: PathBuf,
    },

    /// Dashboard numbers for one drive
    Stats { drive_id: DriveId },

    /// Run the deferred tasks that are due now
    RunTasks,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,drive_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let deps = ServerDeps::from_config(&config, Arc::new(LoggingNotifier)).await?;

    match cli.command {
        Commands::Create { file } => {
            let input: NewDrive = read_json(&file)?;
            print_json(&create_drive(input, &deps).await?)?;
        }
        Commands::Get { drive_id } => print_json(&get_drive(drive_id, &deps).await?)?,
        Commands::List => print_json(&list_drives(&deps).await?)?,
        Commands::Schedule { drive_id } => {
            print_json(&trigger_scheduling(drive_id, &deps).await?)?
        }
        Commands::Outcome {
            drive_id,
            event_id,
            status,
            decision,
            question,
            ready_for_next,
            break_minutes,
        } => {
            let outcome = EventOutcome {
                decision: parse_wire_enum::<Decision>(decision.as_deref())?,
                question,
                status: parse_wire_enum::<EventStatus>(status.as_deref())?,
                ready_for_next,
                break_minutes,
            };
            print_json(&record_event_outcome(drive_id, event_id, outcome, &deps).await?)?;
        }
        Commands::Respond { drive_id, file } => {
            let response: NotificationResponse = read_json(&file)?;
            print_json(&respond_to_notification(drive_id, response, &deps).await?)?;
        }
        Commands::Stats { drive_id } => print_json(&get_stats(drive_id, &deps).await?)?,
        Commands::RunTasks => {
            let summary = run_due_tasks(&deps, config.worker_config()).await?;
            println!(
                "{}",
                serde_json::json!({
                    "claimed": summary.claimed,
                    "succeeded": summary.succeeded,
                    "retrying": summary.retrying,
                    "deadLettered": summary.dead_lettered,
                })
            );
        }
    }

    deps.notifications.flush().await;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parses an enum from its wire name, e.g. `strong_yes` or `STRONG_YES`.
fn parse_wire_enum<T: DeserializeOwned>(raw: Option<&str>) -> Result<Option<T>> {
    raw.map(|value| {
        serde_json::from_value(serde_json::Value::String(value.to_uppercase()))
            .with_context(|| format!("Unknown value: {}", value))
    })
    .transpose()
}
