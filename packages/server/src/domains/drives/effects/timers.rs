//! Arms deferred tasks. Tasks carry only the drive id and a target; the
//! handler reloads the drive when the timer fires.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::common::{DriveId, EventId};
use crate::domains::drives::models::Drive;
use crate::kernel::jobs::{DeferredTask, TaskKind};
use crate::kernel::ServerDeps;

/// Re-run the engines when each interviewer's slot opens, for slots that open
/// after `now`.
pub async fn arm_slot_openings(drive: &Drive, now: DateTime<Utc>, deps: &ServerDeps) -> usize {
    let mut armed = 0;
    for interviewer in drive.interviewers.iter().filter(|i| i.slot_start > now) {
        let kind = TaskKind::SlotOpened {
            interviewer_email: interviewer.email.clone(),
        };
        if arm(drive.id, kind, interviewer.slot_start, now, deps).await {
            armed += 1;
        }
    }
    armed
}

pub async fn arm_break_over(
    drive_id: DriveId,
    interviewer_email: &str,
    until: DateTime<Utc>,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> bool {
    let kind = TaskKind::BreakOver {
        interviewer_email: interviewer_email.to_string(),
    };
    arm(drive_id, kind, until, now, deps).await
}

pub async fn arm_feedback_due(
    drive_id: DriveId,
    event_id: EventId,
    at: DateTime<Utc>,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> bool {
    arm(drive_id, TaskKind::FeedbackDue { event_id }, at, now, deps).await
}

/// Arming failures are logged, not propagated.
async fn arm(
    drive_id: DriveId,
    kind: TaskKind,
    run_at: DateTime<Utc>,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> bool {
    let name = kind.name();
    let task = DeferredTask::builder()
        .drive_id(drive_id)
        .kind(kind)
        .run_at(run_at)
        .max_attempts(deps.task_max_attempts)
        .created_at(now)
        .updated_at(now)
        .build();

    match deps.tasks.schedule(task).await {
        Ok(task_id) => {
            debug!(drive_id = %drive_id, task_id = %task_id, kind = name, run_at = %run_at, "deferred task armed");
            true
        }
        Err(e) => {
            warn!(drive_id = %drive_id, kind = name, error = %e, "failed to arm deferred task");
            false
        }
    }
}
