//! Deferred task model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use typed_builder::TypedBuilder;

use crate::common::{DriveId, EventId, TaskId};

/// Retry delays never exceed an hour.
const MAX_RETRY_DELAY_SECS: i64 = 3600;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "deferred_task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    DeadLetter,
}

impl TaskStatus {
    /// Nothing will run this task again.
    pub fn is_finished(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::DeadLetter)
    }
}

/// What to do when the timer fires. Every kind reloads the drive first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// An interviewer's availability window opens.
    SlotOpened { interviewer_email: String },
    /// A requested break ends.
    BreakOver { interviewer_email: String },
    /// An ongoing interview should be over; ask for feedback.
    FeedbackDue { event_id: EventId },
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::SlotOpened { .. } => "slot_opened",
            TaskKind::BreakOver { .. } => "break_over",
            TaskKind::FeedbackDue { .. } => "feedback_due",
        }
    }
}

// ============================================================================
// DeferredTask Model
// ============================================================================

#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct DeferredTask {
    #[builder(default = TaskId::new())]
    pub id: TaskId,
    pub drive_id: DriveId,
    #[builder(setter(transform = |kind: TaskKind| Json(kind)))]
    pub kind: Json<TaskKind>,
    pub run_at: DateTime<Utc>,

    #[builder(default)]
    pub status: TaskStatus,
    #[builder(default = 0)]
    pub attempt: i32,
    #[builder(default = 3)]
    pub max_attempts: i32,
    #[builder(default, setter(strip_option, into))]
    pub last_error: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub worker_id: Option<String>,
    #[builder(default, setter(strip_option))]
    pub lease_expires_at: Option<DateTime<Utc>>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl DeferredTask {
    pub fn kind(&self) -> &TaskKind {
        &self.kind.0
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Pending && self.run_at <= now
    }

    /// Whether a running task's lease ran out (its worker died).
    pub fn is_abandoned(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Running && self.lease_expires_at.is_some_and(|at| at < now)
    }

    pub fn attempts_left(&self) -> bool {
        self.attempt < self.max_attempts
    }
}

/// Delay before retrying after the `attempt`-th failure: 2^attempt seconds,
/// capped at an hour.
pub fn retry_delay(attempt: i32) -> Duration {
    let exponent = attempt.clamp(0, 12) as u32;
    Duration::seconds(2i64.pow(exponent).min(MAX_RETRY_DELAY_SECS))
}
