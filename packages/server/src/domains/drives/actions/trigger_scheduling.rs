//! Trigger scheduling action

use serde::Serialize;
use tracing::info;

use crate::common::{DriveId, DriveResult, EventId};
use crate::domains::drives::effects::announce_scheduled;
use crate::domains::drives::machines::{refresh_statuses, schedule_interviews};
use crate::domains::drives::models::Event;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOutcome {
    pub drive_id: DriveId,
    pub new_event_count: usize,
    pub new_event_ids: Vec<EventId>,
    pub version: i64,
}

/// Refresh every participant status for the current time and run one
/// scheduling pass.
pub async fn trigger_scheduling(
    drive_id: DriveId,
    deps: &ServerDeps,
) -> DriveResult<SchedulingOutcome> {
    let mutation = super::mutate_drive(drive_id, deps, |drive, now| {
        refresh_statuses(drive, now);
        Ok(schedule_interviews(drive, now))
    })
    .await?;

    let scheduled: Vec<Event> = mutation.output;
    info!(
        drive_id = %drive_id,
        new_events = scheduled.len(),
        version = mutation.drive.version,
        "scheduling triggered"
    );
    announce_scheduled(&mutation.drive, &scheduled, deps);

    Ok(SchedulingOutcome {
        drive_id,
        new_event_count: scheduled.len(),
        new_event_ids: scheduled.iter().map(|e| e.id).collect(),
        version: mutation.drive.version,
    })
}
