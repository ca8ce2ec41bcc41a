//! Record event outcome action
//!
//! Applies an interviewer's update to one event (status, decision, asked
//! question, break request), re-derives statuses and runs a scheduling pass,
//! all inside one versioned write.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use typed_builder::TypedBuilder;

use crate::common::{DriveError, DriveId, DriveResult, EventId};
use crate::domains::drives::effects::{
    announce_scheduled, announce_start, arm_break_over, arm_feedback_due,
};
use crate::domains::drives::machines::{refresh_statuses, schedule_interviews};
use crate::domains::drives::models::{Decision, Drive, Event, EventStatus};
use crate::kernel::ServerDeps;

/// Longest break an interviewer may ask for after an interview.
pub const MAX_BREAK_MINUTES: u32 = 240;

/// Partial update for one event. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[builder(field_defaults(default, setter(strip_option)))]
pub struct EventOutcome {
    pub decision: Option<Decision>,
    pub question: Option<String>,
    pub status: Option<EventStatus>,
    pub ready_for_next: Option<bool>,
    pub break_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecorded {
    pub event: Event,
    pub new_event_count: usize,
    /// Candidates whose overall decision became final with this update.
    pub decided: Vec<(String, Decision)>,
    pub version: i64,
}

/// What the pure part of the update produced, for the post-save effects.
struct Applied {
    event: Event,
    started: bool,
    break_until: Option<DateTime<Utc>>,
    scheduled: Vec<Event>,
    decided: Vec<(String, Decision)>,
}

pub async fn record_event_outcome(
    drive_id: DriveId,
    event_id: EventId,
    outcome: EventOutcome,
    deps: &ServerDeps,
) -> DriveResult<OutcomeRecorded> {
    if let Some(minutes) = outcome.break_minutes {
        if minutes > MAX_BREAK_MINUTES {
            return Err(DriveError::validation(format!(
                "breakMinutes must be between 0 and {}, got {}",
                MAX_BREAK_MINUTES, minutes
            )));
        }
    }

    let mutation = super::mutate_drive(drive_id, deps, |drive, now| {
        apply_outcome(drive, event_id, &outcome, now)
    })
    .await?;
    let applied = mutation.output;
    let drive = &mutation.drive;

    info!(
        drive_id = %drive_id,
        event_id = %event_id,
        status = ?applied.event.status,
        decision = ?applied.event.decision,
        new_events = applied.scheduled.len(),
        decided = applied.decided.len(),
        "event outcome recorded"
    );

    announce_scheduled(drive, &applied.scheduled, deps);
    if applied.started {
        announce_start(drive, &applied.event, deps);
        arm_feedback_due(drive_id, event_id, applied.event.end_time(), mutation.now, deps).await;
    }
    if let Some(until) = applied.break_until {
        arm_break_over(
            drive_id,
            &applied.event.interviewer_email,
            until,
            mutation.now,
            deps,
        )
        .await;
    }

    Ok(OutcomeRecorded {
        new_event_count: applied.scheduled.len(),
        event: applied.event,
        decided: applied.decided,
        version: mutation.drive.version,
    })
}

fn apply_outcome(
    drive: &mut Drive,
    event_id: EventId,
    outcome: &EventOutcome,
    now: DateTime<Utc>,
) -> DriveResult<Applied> {
    let drive_id = drive.id;
    let event = drive
        .event_mut(event_id)
        .ok_or(DriveError::EventNotFound { drive_id, event_id })?;

    let previous = event.status;
    let target = outcome.status.unwrap_or(previous);
    if !previous.can_move_to(target) {
        return Err(DriveError::validation(format!(
            "event {} cannot move from {:?} to {:?}",
            event_id, previous, target
        )));
    }

    if let Some(decision) = outcome.decision {
        if target != EventStatus::Completed {
            return Err(DriveError::validation(
                "a decision can only be recorded for a completed interview",
            ));
        }
        if !event.decision.is_pending() && event.decision != decision {
            return Err(DriveError::validation(format!(
                "event {} already has decision {:?}",
                event_id, event.decision
            )));
        }
        event.decision = decision;
    }
    if target == EventStatus::Completed && event.decision.is_pending() {
        return Err(DriveError::validation("a completed interview needs a decision"));
    }

    event.status = target;
    if let Some(question) = &outcome.question {
        event.question = Some(question.clone());
    }
    let event = event.clone();

    let mut break_until = None;
    if target == EventStatus::Completed {
        if let Some(interviewer) = drive.interviewer_mut(&event.interviewer_email) {
            match (outcome.ready_for_next, outcome.break_minutes) {
                (Some(true), _) => interviewer.break_until = None,
                (_, Some(minutes)) if minutes > 0 => {
                    let until = now + Duration::minutes(i64::from(minutes));
                    interviewer.break_until = Some(until);
                    break_until = Some(until);
                }
                _ => {}
            }
        }
    }

    let report = refresh_statuses(drive, now);
    let scheduled = schedule_interviews(drive, now);

    Ok(Applied {
        started: previous == EventStatus::Scheduled && target == EventStatus::Ongoing,
        event,
        break_until,
        scheduled,
        decided: report.decided,
    })
}
