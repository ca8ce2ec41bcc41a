//! Test fixtures for building drives.
//!
//! Every fixture day is 2026-03-02 UTC; drives run 08:00-18:00.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use drive_core::domains::drives::models::{Candidate, Interviewer, NewDrive, Round, RoundName};

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
}

pub fn candidate(email: &str, level: &str) -> Candidate {
    Candidate::builder()
        .email(email)
        .name(email.split('@').next().unwrap_or(email))
        .resume(format!("https://resumes.example.com/{}", email))
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
        .name(email.split('@').next().unwrap_or(email))
        .job_family("SDE")
        .level(level)
        .eligible_rounds(rounds.iter().copied().collect::<BTreeSet<_>>())
        .max_interviews(max_interviews)
        .slot_start(slot.0)
        .slot_end(slot.1)
        .build()
}

pub fn drive_input(
    rounds: Vec<Round>,
    candidates: Vec<Candidate>,
    interviewers: Vec<Interviewer>,
) -> NewDrive {
    NewDrive::builder()
        .name("Spring SDE drive")
        .start_time(at(8, 0))
        .end_time(at(18, 0))
        .rounds(rounds)
        .candidates(candidates)
        .interviewers(interviewers)
        .build()
}

/// BPS (elimination) then CODING1, with one interviewer per round.
pub fn two_round_drive(candidates: Vec<Candidate>) -> NewDrive {
    drive_input(
        vec![
            Round::new(RoundName::Bps, 30).elimination(),
            Round::new(RoundName::Coding1, 60),
        ],
        candidates,
        vec![
            interviewer("bps@corp.io", "5A", &[RoundName::Bps], 4, (at(9, 0), at(17, 0))),
            interviewer("code@corp.io", "5B", &[RoundName::Coding1], 4, (at(9, 0), at(17, 0))),
        ],
    )
}
