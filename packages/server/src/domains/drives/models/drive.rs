//! Drive record - the versioned aggregate for one hiring event.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::event::Event;
use super::participant::{Candidate, Decision, Interviewer, ParticipantStatus};
use super::round::Round;
use crate::common::{DriveError, DriveId, DriveResult, EventId};

/// Input for creating a drive.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
#[serde(rename_all = "camelCase")]
pub struct NewDrive {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub rounds: Vec<Round>,
    #[builder(default)]
    #[serde(default)]
    pub interviewers: Vec<Interviewer>,
    #[builder(default)]
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drive {
    pub id: DriveId,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub rounds: Vec<Round>,
    pub candidates: Vec<Candidate>,
    pub interviewers: Vec<Interviewer>,
    /// Append-only.
    pub events: Vec<Event>,
    /// Optimistic concurrency token, owned by the store.
    #[serde(default)]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Drive {
    /// Builds a fresh record with no events and every participant reset to
    /// WAITING / PENDING.
    pub fn from_new(input: NewDrive, now: DateTime<Utc>) -> DriveResult<Self> {
        input.validate()?;

        let candidates = input
            .candidates
            .into_iter()
            .map(|mut c| {
                c.email = c.email.trim().to_string();
                c.overall_decision = Decision::Pending;
                c.current_status = ParticipantStatus::Waiting;
                c
            })
            .collect();
        let interviewers = input
            .interviewers
            .into_iter()
            .map(|mut i| {
                i.email = i.email.trim().to_string();
                i.current_status = ParticipantStatus::Waiting;
                i.break_until = None;
                i
            })
            .collect();

        Ok(Self {
            id: DriveId::new(),
            name: input.name.trim().to_string(),
            start_time: input.start_time,
            end_time: input.end_time,
            rounds: input.rounds,
            candidates,
            interviewers,
            events: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    pub fn event(&self, event_id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    pub fn event_mut(&mut self, event_id: EventId) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.id == event_id)
    }

    pub fn candidate(&self, email: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.email == email)
    }

    pub fn candidate_mut(&mut self, email: &str) -> Option<&mut Candidate> {
        self.candidates.iter_mut().find(|c| c.email == email)
    }

    pub fn interviewer(&self, email: &str) -> Option<&Interviewer> {
        self.interviewers.iter().find(|i| i.email == email)
    }

    pub fn interviewer_mut(&mut self, email: &str) -> Option<&mut Interviewer> {
        self.interviewers.iter_mut().find(|i| i.email == email)
    }

    /// Events of a candidate in creation order.
    pub fn events_for_candidate<'a>(&'a self, email: &'a str) -> impl Iterator<Item = &'a Event> {
        self.events.iter().filter(move |e| e.candidate_email == email)
    }

    /// Events of an interviewer in creation order.
    pub fn events_for_interviewer<'a>(
        &'a self,
        email: &'a str,
    ) -> impl Iterator<Item = &'a Event> {
        self.events.iter().filter(move |e| e.interviewer_email == email)
    }

    pub fn all_candidates_decided(&self) -> bool {
        self.candidates
            .iter()
            .all(|c| !c.overall_decision.is_pending())
    }

    // ------------------------------------------------------------------------
    // Invariants
    // ------------------------------------------------------------------------

    /// Lists every broken runtime invariant. Empty means consistent.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.start_time >= self.end_time {
            violations.push("drive window is empty".to_string());
        }

        let mut ids = HashSet::new();
        let mut pairs = HashSet::new();
        let mut candidate_rounds = HashSet::new();

        for event in &self.events {
            if !ids.insert(event.id) {
                violations.push(format!("duplicate event id {}", event.id));
            }
            if !pairs.insert((&event.candidate_email, &event.interviewer_email)) {
                violations.push(format!(
                    "{} paired with {} more than once",
                    event.candidate_email, event.interviewer_email
                ));
            }
            if !candidate_rounds.insert((&event.candidate_email, event.round.name)) {
                violations.push(format!(
                    "{} has more than one {} event",
                    event.candidate_email, event.round.name
                ));
            }
            if event.start_time < self.start_time || event.end_time() > self.end_time {
                violations.push(format!("event {} outside drive window", event.id));
            }
            if let Some(interviewer) = self.interviewer(&event.interviewer_email) {
                if event.start_time < interviewer.slot_start
                    || event.end_time() > interviewer.slot_end
                {
                    violations.push(format!("event {} outside interviewer slot", event.id));
                }
            }
        }

        for interviewer in &self.interviewers {
            let events: Vec<&Event> = self.events_for_interviewer(&interviewer.email).collect();
            if events.len() > interviewer.max_interviews as usize {
                violations.push(format!("{} over capacity", interviewer.email));
            }
            for (i, a) in events.iter().enumerate() {
                for b in &events[i + 1..] {
                    if a.overlaps(b.start_time, b.end_time()) {
                        violations.push(format!(
                            "{} double-booked: {} and {}",
                            interviewer.email, a.id, b.id
                        ));
                    }
                }
            }
        }

        violations
    }
}

impl NewDrive {
    /// Rejects malformed creation input before any engine runs.
    pub fn validate(&self) -> DriveResult<()> {
        validate_new_drive(self)
    }
}

fn validate_new_drive(input: &NewDrive) -> DriveResult<()> {
    if input.name.trim().is_empty() {
        return Err(DriveError::validation("drive name must not be empty"));
    }
    if input.start_time >= input.end_time {
        return Err(DriveError::validation("drive start must be before drive end"));
    }
    if input.rounds.is_empty() {
        return Err(DriveError::validation("a drive needs at least one round"));
    }

    let mut round_names = HashSet::new();
    for round in &input.rounds {
        if !round_names.insert(round.name) {
            return Err(DriveError::validation(format!(
                "round {} listed twice",
                round.name
            )));
        }
        if round.duration_minutes == 0 {
            return Err(DriveError::validation(format!(
                "round {} must have a positive duration",
                round.name
            )));
        }
    }

    let mut candidate_emails = HashSet::new();
    for candidate in &input.candidates {
        let email = candidate.email.trim();
        if email.is_empty() {
            return Err(DriveError::validation("candidate email must not be empty"));
        }
        if !candidate_emails.insert(email) {
            return Err(DriveError::validation(format!(
                "duplicate candidate {}",
                email
            )));
        }
    }

    let mut interviewer_emails = HashSet::new();
    for interviewer in &input.interviewers {
        let email = interviewer.email.trim();
        if email.is_empty() {
            return Err(DriveError::validation("interviewer email must not be empty"));
        }
        if !interviewer_emails.insert(email) {
            return Err(DriveError::validation(format!(
                "duplicate interviewer {}",
                email
            )));
        }
        if interviewer.slot_start >= interviewer.slot_end {
            return Err(DriveError::validation(format!(
                "interviewer {} slot start must be before slot end",
                email
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::drives::models::RoundName;
    use chrono::{Duration, TimeZone};

    fn base() -> NewDrive {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        NewDrive::builder()
            .name("Spring drive")
            .start_time(start)
            .end_time(start + Duration::hours(8))
            .rounds(vec![Round::new(RoundName::Bps, 30)])
            .candidates(vec![Candidate::builder()
                .email("c@x.io")
                .name("C")
                .job_family("SDE")
                .level("4")
                .overall_decision(Decision::Yes)
                .build()])
            .interviewers(vec![Interviewer::builder()
                .email("i@x.io")
                .name("I")
                .job_family("SDE")
                .level("5A")
                .eligible_rounds([RoundName::Bps])
                .max_interviews(2u32)
                .slot_start(start)
                .slot_end(start + Duration::hours(2))
                .build()])
            .build()
    }

    #[test]
    fn test_from_new_resets_participant_state() {
        let drive = Drive::from_new(base(), Utc::now()).unwrap();
        assert!(drive.events.is_empty());
        assert_eq!(drive.version, 0);
        assert_eq!(drive.candidates[0].overall_decision, Decision::Pending);
        assert!(drive.check_invariants().is_empty());
    }

    #[test]
    fn test_rejects_inverted_window() {
        let mut input = base();
        input.end_time = input.start_time;
        assert!(matches!(
            Drive::from_new(input, Utc::now()),
            Err(DriveError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_rounds_and_emails() {
        let mut input = base();
        input.rounds.push(Round::new(RoundName::Bps, 45));
        assert!(input.validate().is_err());

        let mut input = base();
        let dup = input.candidates[0].clone();
        input.candidates.push(dup);
        assert!(input.validate().is_err());

        let mut input = base();
        let dup = input.interviewers[0].clone();
        input.interviewers.push(dup);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_interviewer_slot() {
        let mut input = base();
        input.interviewers[0].slot_end = input.interviewers[0].slot_start;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_check_invariants_detect_double_booking() {
        let mut drive = Drive::from_new(base(), Utc::now()).unwrap();
        let start = drive.start_time;
        let round = drive.rounds[0].clone();
        drive
            .events
            .push(Event::new(drive.id, round.clone(), "c@x.io", "i@x.io", start));
        let mut clash = Event::new(drive.id, round, "d@x.io", "i@x.io", start + Duration::minutes(15));
        clash.round.name = RoundName::Coding1;
        drive.events.push(clash);

        let violations = drive.check_invariants();
        assert!(violations.iter().any(|v| v.contains("double-booked")));
    }
}
