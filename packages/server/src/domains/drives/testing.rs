//! Builders shared by the drive unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::common::{DriveId, EventId};

use super::models::{Candidate, Drive, Event, Interviewer, NewDrive, Round, RoundName};

/// 2026-03-02 at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
}

pub fn candidate(email: &str, level: &str) -> Candidate {
    Candidate::builder()
        .email(email)
        .name(email)
        .job_family("SDE")
        .level(level)
        .build()
}

pub fn interviewer(
    email: &str,
    level: &str,
    rounds: &[RoundName],
    max_interviews: u32,
    slot: (DateTime<Utc>, DateTime<Utc>),
) -> Interviewer {
    Interviewer::builder()
        .email(email)
        .name(email)
        .job_family("SDE")
        .level(level)
        .eligible_rounds(rounds.iter().copied().collect::<std::collections::BTreeSet<_>>())
        .max_interviews(max_interviews)
        .slot_start(slot.0)
        .slot_end(slot.1)
        .build()
}

/// A drive running 08:00-18:00 with the given participants.
pub fn drive(rounds: Vec<Round>, candidates: Vec<Candidate>, interviewers: Vec<Interviewer>) -> Drive {
    let input = NewDrive::builder()
        .name("Test drive")
        .start_time(at(8, 0))
        .end_time(at(18, 0))
        .rounds(rounds)
        .candidates(candidates)
        .interviewers(interviewers)
        .build();
    Drive::from_new(input, at(7, 0)).unwrap()
}

/// Appends a finished interview for `candidate` with the given decision.
pub fn complete(
    drive: &mut Drive,
    round: RoundName,
    candidate: &str,
    interviewer: &str,
    start: DateTime<Utc>,
    decision: super::models::Decision,
) {
    let round = drive
        .rounds
        .iter()
        .find(|r| r.name == round)
        .cloned()
        .unwrap_or_else(|| Round::new(round, 30));
    let mut event = Event::new(drive.id, round, candidate, interviewer, start);
    event.status = super::models::EventStatus::Completed;
    event.decision = decision;
    drive.events.push(event);
}

pub fn minutes(n: i64) -> Duration {
    Duration::minutes(n)
}

/// An event id no drive in the test contains.
pub fn stray_event_id() -> EventId {
    Event::id_for(DriveId::new(), "nobody@x.io", &Round::new(RoundName::Bps, 30))
}
