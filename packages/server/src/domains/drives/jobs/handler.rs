//! Deferred task handler for drives.
//!
//! Tasks only name the drive and a target. Every handler reloads the drive so a
//! timer that fires after the world moved on re-derives instead of replaying a
//! stale snapshot.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::common::{DriveError, DriveId, EventId};
use crate::domains::drives::actions::{get_drive, mutate_drive, trigger_scheduling};
use crate::domains::drives::effects::{announce_scheduled, request_feedback};
use crate::domains::drives::machines::{refresh_statuses, schedule_interviews};
use crate::kernel::jobs::{DeferredTask, TaskHandler, TaskKind};
use crate::kernel::ServerDeps;

pub struct DriveTaskHandler {
    deps: ServerDeps,
}

impl DriveTaskHandler {
    pub fn new(deps: ServerDeps) -> Self {
        Self { deps }
    }

    async fn slot_opened(&self, drive_id: DriveId, interviewer_email: &str) -> Result<()> {
        let outcome = trigger_scheduling(drive_id, &self.deps).await?;
        info!(
            drive_id = %drive_id,
            interviewer = interviewer_email,
            new_events = outcome.new_event_count,
            "interviewer slot opened"
        );
        Ok(())
    }

    async fn break_over(&self, drive_id: DriveId, interviewer_email: &str) -> Result<()> {
        let mutation = mutate_drive(drive_id, &self.deps, |drive, now| {
            if let Some(interviewer) = drive.interviewer_mut(interviewer_email) {
                // A later break request supersedes this timer.
                if interviewer.break_until.is_some_and(|until| until <= now) {
                    interviewer.break_until = None;
                }
            }
            refresh_statuses(drive, now);
            Ok(schedule_interviews(drive, now))
        })
        .await?;

        info!(
            drive_id = %drive_id,
            interviewer = interviewer_email,
            new_events = mutation.output.len(),
            "interviewer break over"
        );
        announce_scheduled(&mutation.drive, &mutation.output, &self.deps);
        Ok(())
    }

    async fn feedback_due(&self, drive_id: DriveId, event_id: EventId) -> Result<()> {
        let drive = get_drive(drive_id, &self.deps).await?;
        match drive.event(event_id) {
            Some(event) if event.is_ongoing() => {
                info!(drive_id = %drive_id, event_id = %event_id, "requesting interview feedback");
                request_feedback(&drive, event, &self.deps);
            }
            Some(_) => debug!(drive_id = %drive_id, event_id = %event_id, "interview no longer ongoing"),
            None => debug!(drive_id = %drive_id, event_id = %event_id, "event not in drive"),
        }
        Ok(())
    }
}

#[async_trait]
impl TaskHandler for DriveTaskHandler {
    async fn handle(&self, task: &DeferredTask) -> Result<()> {
        let drive_id = task.drive_id;
        let result = match task.kind() {
            TaskKind::SlotOpened { interviewer_email } => {
                self.slot_opened(drive_id, interviewer_email).await
            }
            TaskKind::BreakOver { interviewer_email } => {
                self.break_over(drive_id, interviewer_email).await
            }
            TaskKind::FeedbackDue { event_id } => self.feedback_due(drive_id, *event_id).await,
        };

        // Retrying cannot bring a missing drive back.
        match result {
            Err(e) if is_drive_gone(&e) => {
                info!(drive_id = %drive_id, task_id = %task.id, "drive gone, dropping task");
                Ok(())
            }
            other => other,
        }
    }
}

fn is_drive_gone(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<DriveError>(),
        Some(DriveError::DriveNotFound { .. })
    )
}
