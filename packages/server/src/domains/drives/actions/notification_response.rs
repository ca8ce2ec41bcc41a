//! Replies from participants to the notifications they were sent.
//!
//! Each reply maps onto [`record_event_outcome`](super::record_event_outcome);
//! an acceptance or decline of a booking is acknowledged only.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::{DriveError, DriveId, DriveResult, EventId};
use crate::domains::drives::models::{Decision, EventStatus};
use crate::kernel::{RecipientRole, ServerDeps};

use super::record_outcome::{EventOutcome, OutcomeRecorded};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub source: RecipientRole,
    pub email: String,
    pub event_id: EventId,
    pub response: ResponseKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseKind {
    Scheduled {
        accepted: bool,
    },
    Start {
        started: bool,
    },
    #[serde(rename_all = "camelCase")]
    Completed {
        decision: Decision,
        #[serde(default)]
        question: Option<String>,
        ready_for_next: bool,
        #[serde(default)]
        break_minutes: u32,
    },
}

impl ResponseKind {
    fn name(&self) -> &'static str {
        match self {
            ResponseKind::Scheduled { .. } => "scheduled",
            ResponseKind::Start { .. } => "start",
            ResponseKind::Completed { .. } => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ResponseHandled {
    /// Nothing on the drive changed.
    Acknowledged,
    Recorded(OutcomeRecorded),
}

pub async fn respond_to_notification(
    drive_id: DriveId,
    response: NotificationResponse,
    deps: &ServerDeps,
) -> DriveResult<ResponseHandled> {
    let drive = super::get_drive(drive_id, deps).await?;
    let event = drive.event(response.event_id).ok_or(DriveError::EventNotFound {
        drive_id,
        event_id: response.event_id,
    })?;

    let email = response.email.trim();
    let expected = match response.source {
        RecipientRole::Candidate => &event.candidate_email,
        RecipientRole::Interviewer => &event.interviewer_email,
    };
    if !expected.eq_ignore_ascii_case(email) {
        return Err(DriveError::validation(format!(
            "{} is not the {:?} of event {}",
            email, response.source, response.event_id
        )));
    }

    info!(
        drive_id = %drive_id,
        event_id = %response.event_id,
        source = ?response.source,
        email,
        kind = response.response.name(),
        "notification response received"
    );

    let outcome = match response.response {
        ResponseKind::Scheduled { accepted } => {
            if !accepted {
                warn!(
                    drive_id = %drive_id,
                    event_id = %response.event_id,
                    email,
                    "interview declined, rescheduling is not supported"
                );
            }
            return Ok(ResponseHandled::Acknowledged);
        }
        ResponseKind::Start { started: false } => return Ok(ResponseHandled::Acknowledged),
        ResponseKind::Start { started: true } => {
            EventOutcome::builder().status(EventStatus::Ongoing).build()
        }
        ResponseKind::Completed {
            decision,
            question,
            ready_for_next,
            break_minutes,
        } => EventOutcome {
            decision: Some(decision),
            question,
            status: Some(EventStatus::Completed),
            ready_for_next: Some(ready_for_next),
            break_minutes: Some(break_minutes),
        },
    };

    let recorded =
        super::record_event_outcome(drive_id, response.event_id, outcome, deps).await?;
    Ok(ResponseHandled::Recorded(recorded))
}
