use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::participant::Decision;
use super::round::Round;
use crate::common::{DriveId, EventId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
}

impl EventStatus {
    /// Position in the forward-only lifecycle.
    pub fn rank(&self) -> u8 {
        match self {
            EventStatus::Scheduled => 0,
            EventStatus::Ongoing => 1,
            EventStatus::Completed => 2,
        }
    }

    pub fn can_move_to(&self, next: EventStatus) -> bool {
        next.rank() >= self.rank()
    }
}

/// External links attached to an interview. Placeholders until real
/// integrations exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLinks {
    pub conferencing: String,
    pub assessment: String,
    pub scorecard: String,
}

impl EventLinks {
    pub fn placeholder(
        event_id: EventId,
        candidate_email: &str,
        interviewer_email: &str,
        round: &Round,
    ) -> Self {
        Self {
            conferencing: format!(
                "https://meet.example.com/j/{}",
                event_id.as_uuid().simple()
            ),
            assessment: format!("https://assess.example.com/test/{}", event_id),
            scorecard: format!(
                "https://scorecard.example.com/{}/{}/{}",
                candidate_email, interviewer_email, round.name
            ),
        }
    }
}

/// One scheduled interview binding a candidate, an interviewer and a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub round: Round,
    pub candidate_email: String,
    pub interviewer_email: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub decision: Decision,
    pub links: EventLinks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl Event {
    /// Stable id for a (candidate, round) pair within a drive.
    ///
    /// A candidate holds at most one event per round name, so the pair is
    /// unique and the id needs no randomness.
    pub fn id_for(drive_id: DriveId, candidate_email: &str, round: &Round) -> EventId {
        EventId::derived(
            drive_id.as_uuid(),
            &format!("{}:{}", candidate_email, round.name),
        )
    }

    pub fn new(
        drive_id: DriveId,
        round: Round,
        candidate_email: &str,
        interviewer_email: &str,
        start_time: DateTime<Utc>,
    ) -> Self {
        let id = Self::id_for(drive_id, candidate_email, &round);
        let links = EventLinks::placeholder(id, candidate_email, interviewer_email, &round);
        Self {
            id,
            duration_minutes: round.duration_minutes,
            round,
            candidate_email: candidate_email.to_string(),
            interviewer_email: interviewer_email.to_string(),
            start_time,
            status: EventStatus::Scheduled,
            decision: Decision::Pending,
            links,
            question: None,
        }
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Whether `[start, end)` intersects this event's `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end_time() && self.start_time < end
    }

    pub fn is_completed(&self) -> bool {
        self.status == EventStatus::Completed
    }

    pub fn is_ongoing(&self) -> bool {
        self.status == EventStatus::Ongoing
    }
}
