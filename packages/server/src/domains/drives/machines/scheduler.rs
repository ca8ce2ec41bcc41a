//! Scheduling engine.
//!
//! Greedy first-fit matching: every call gives each eligible candidate at most
//! one new interview. Rounds that already have an event are never offered
//! again, so calling twice without a state change yields nothing new.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domains::drives::models::{
    Candidate, Drive, Event, Interviewer, ParticipantStatus, Round,
};

/// Lead time between scheduling and the earliest interview start.
pub const SCHEDULING_BUFFER_MINUTES: i64 = 15;

/// Finds new interviews and appends them to `drive.events`.
///
/// Candidates are visited in record order, which is also the order of the
/// returned events.
pub fn schedule_interviews(drive: &mut Drive, now: DateTime<Utc>) -> Vec<Event> {
    let earliest_start = now + Duration::minutes(SCHEDULING_BUFFER_MINUTES);
    let mut created = Vec::new();

    for idx in 0..drive.candidates.len() {
        let candidate = &drive.candidates[idx];
        if !candidate.overall_decision.is_pending()
            || candidate.current_status == ParticipantStatus::Busy
        {
            continue;
        }

        let rounds = eligible_rounds(candidate, drive);
        let Some(round) = rounds.first() else {
            continue;
        };

        let Some((interviewer, start)) = pick_interviewer(candidate, round, drive, earliest_start)
        else {
            debug!(
                drive_id = %drive.id,
                candidate = %candidate.email,
                round = %round.name,
                "no interviewer available"
            );
            continue;
        };

        let start = start.max(drive.start_time).max(interviewer.slot_start);
        let event = Event::new(
            drive.id,
            (*round).clone(),
            &candidate.email,
            &interviewer.email,
            start,
        );
        debug!(
            drive_id = %drive.id,
            event_id = %event.id,
            candidate = %event.candidate_email,
            interviewer = %event.interviewer_email,
            round = %event.round.name,
            start = %event.start_time,
            "interview scheduled"
        );

        drive.events.push(event.clone());
        created.push(event);
    }

    created
}

/// Rounds the candidate may be scheduled for next, in drive order.
///
/// The most recent elimination interview gates everything: until it has a
/// YES-equivalent decision the candidate gets nothing. An outstanding
/// elimination round is always taken before any other round.
pub fn eligible_rounds<'a>(candidate: &Candidate, drive: &'a Drive) -> Vec<&'a Round> {
    let last_elimination = drive
        .events_for_candidate(&candidate.email)
        .filter(|e| {
            drive
                .rounds
                .iter()
                .find(|r| r.name == e.round.name)
                .map_or(e.round.is_elimination, |r| r.is_elimination)
        })
        .last();

    if let Some(event) = last_elimination {
        if !(event.is_completed() && event.decision.is_positive()) {
            return Vec::new();
        }
    }

    let taken: HashSet<_> = drive
        .events_for_candidate(&candidate.email)
        .map(|e| e.round.name)
        .collect();
    let pending: Vec<&Round> = drive
        .rounds
        .iter()
        .filter(|r| !taken.contains(&r.name))
        .collect();

    match pending.iter().find(|r| r.is_elimination) {
        Some(elimination) => vec![*elimination],
        None => pending,
    }
}

struct Offer<'a> {
    interviewer: &'a Interviewer,
    start: DateTime<Utc>,
    assigned: u64,
}

impl Offer<'_> {
    /// Earlier start first, then lower `assigned / max_interviews`.
    fn rank(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start).then_with(|| {
            let lhs = self.assigned * u64::from(other.interviewer.max_interviews);
            let rhs = other.assigned * u64::from(self.interviewer.max_interviews);
            lhs.cmp(&rhs)
        })
    }
}

fn pick_interviewer<'a>(
    candidate: &Candidate,
    round: &Round,
    drive: &'a Drive,
    earliest_start: DateTime<Utc>,
) -> Option<(&'a Interviewer, DateTime<Utc>)> {
    let mut offers: Vec<Offer<'a>> = drive
        .interviewers
        .iter()
        .filter_map(|interviewer| {
            if interviewer.current_status != ParticipantStatus::Waiting
                || !interviewer.is_eligible_for(round.name)
                || interviewer.tier() < candidate.tier()
            {
                return None;
            }
            if round.is_job_family_matching_required
                && interviewer.job_family != candidate.job_family
            {
                return None;
            }

            let assigned = drive.events_for_interviewer(&interviewer.email).count();
            if assigned >= interviewer.max_interviews as usize {
                return None;
            }
            if drive
                .events_for_interviewer(&interviewer.email)
                .any(|e| e.candidate_email == candidate.email)
            {
                return None;
            }

            let start = earliest_slot(interviewer, drive, round.duration(), earliest_start)?;
            Some(Offer {
                interviewer,
                start,
                assigned: assigned as u64,
            })
        })
        .collect();

    // Stable, so full ties keep interviewer order.
    offers.sort_by(|a, b| a.rank(b));
    offers
        .into_iter()
        .next()
        .map(|offer| (offer.interviewer, offer.start))
}

/// First start at or after `earliest_start` where `duration` fits inside both
/// the interviewer's slot and the drive window without touching any of the
/// interviewer's existing interviews.
pub fn earliest_slot(
    interviewer: &Interviewer,
    drive: &Drive,
    duration: Duration,
    earliest_start: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let window_start = earliest_start
        .max(interviewer.slot_start)
        .max(drive.start_time);
    let window_end = interviewer.slot_end.min(drive.end_time);
    if window_start >= window_end {
        return None;
    }

    let mut booked: Vec<&Event> = drive.events_for_interviewer(&interviewer.email).collect();
    booked.sort_by_key(|e| e.start_time);

    let mut start = window_start;
    for event in booked {
        if event.overlaps(start, start + duration) {
            start = start.max(event.end_time());
        }
    }

    (start + duration <= window_end).then_some(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::drives::machines::refresh_statuses;
    use crate::domains::drives::models::{Decision, EventStatus, RoundName};
    use crate::domains::drives::testing::*;

    #[test]
    fn test_single_candidate_gets_now_plus_buffer() {
        let now = at(9, 0);
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("c@x.io", "4")],
            vec![interviewer("i@x.io", "5A", &[RoundName::Bps], 3, (now, now + minutes(120)))],
        );
        refresh_statuses(&mut d, now);

        let events = schedule_interviews(&mut d, now);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.start_time, now + minutes(15));
        assert_eq!(event.duration_minutes, 30);
        assert_eq!(event.status, EventStatus::Scheduled);
        assert_eq!(event.decision, Decision::Pending);
        assert_eq!(d.events.len(), 1);
    }

    #[test]
    fn test_slot_search_skips_booked_interval() {
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30), Round::new(RoundName::Coding1, 30)],
            vec![candidate("c@x.io", "4")],
            vec![interviewer(
                "i@x.io",
                "5A",
                &[RoundName::Bps, RoundName::Coding1],
                3,
                (at(9, 0), at(11, 0)),
            )],
        );
        let existing = Event::new(d.id, d.rounds[1].clone(), "other@x.io", "i@x.io", at(10, 0));
        d.events.push(existing);

        let slot = earliest_slot(&d.interviewers[0], &d, minutes(30), at(10, 5));
        assert_eq!(slot, Some(at(10, 30)));

        refresh_statuses(&mut d, at(9, 50));
        let events = schedule_interviews(&mut d, at(9, 50));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_time, at(10, 30));
    }

    #[test]
    fn test_slot_must_fit_before_slot_end() {
        let d = drive(
            vec![Round::new(RoundName::Bps, 60)],
            vec![candidate("c@x.io", "4")],
            vec![interviewer("i@x.io", "5A", &[RoundName::Bps], 3, (at(9, 0), at(10, 0)))],
        );
        assert_eq!(earliest_slot(&d.interviewers[0], &d, minutes(60), at(9, 1)), None);
        assert_eq!(
            earliest_slot(&d.interviewers[0], &d, minutes(60), at(8, 0)),
            Some(at(9, 0))
        );
    }

    #[test]
    fn test_slot_is_bounded_by_drive_window() {
        let d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("c@x.io", "4")],
            vec![interviewer("i@x.io", "5A", &[RoundName::Bps], 3, (at(17, 0), at(20, 0)))],
        );
        assert_eq!(
            earliest_slot(&d.interviewers[0], &d, minutes(30), at(17, 45)),
            None
        );
        assert_eq!(
            earliest_slot(&d.interviewers[0], &d, minutes(30), at(17, 30)),
            Some(at(17, 30))
        );
    }

    #[test]
    fn test_second_pass_is_idempotent() {
        let now = at(9, 0);
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("a@x.io", "4"), candidate("b@x.io", "4")],
            vec![
                interviewer("i@x.io", "5A", &[RoundName::Bps], 3, (now, at(12, 0))),
                interviewer("j@x.io", "5A", &[RoundName::Bps], 3, (now, at(12, 0))),
            ],
        );
        refresh_statuses(&mut d, now);
        assert_eq!(schedule_interviews(&mut d, now).len(), 2);

        refresh_statuses(&mut d, now);
        assert!(schedule_interviews(&mut d, now).is_empty());
        assert!(d.check_invariants().is_empty());
    }

    #[test]
    fn test_junior_interviewer_never_matches_senior_candidate() {
        let now = at(9, 0);
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("c@x.io", "5A")],
            vec![interviewer("i@x.io", "4", &[RoundName::Bps], 3, (now, at(12, 0)))],
        );
        refresh_statuses(&mut d, now);
        assert!(schedule_interviews(&mut d, now).is_empty());
    }

    #[test]
    fn test_job_family_match_when_required() {
        let now = at(9, 0);
        let mut other = interviewer("i@x.io", "5A", &[RoundName::Bps], 3, (now, at(12, 0)));
        other.job_family = "QA".to_string();
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30).job_family_matched()],
            vec![candidate("c@x.io", "4")],
            vec![other],
        );
        refresh_statuses(&mut d, now);
        assert!(schedule_interviews(&mut d, now).is_empty());

        d.rounds[0].is_job_family_matching_required = false;
        assert_eq!(schedule_interviews(&mut d, now).len(), 1);
    }

    #[test]
    fn test_capacity_counts_every_assigned_event() {
        let now = at(9, 0);
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("a@x.io", "4"), candidate("b@x.io", "4")],
            vec![interviewer("i@x.io", "5A", &[RoundName::Bps], 1, (now, at(12, 0)))],
        );
        refresh_statuses(&mut d, now);
        let events = schedule_interviews(&mut d, now);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].candidate_email, "a@x.io");
    }

    #[test]
    fn test_elimination_round_comes_first() {
        let now = at(9, 0);
        let mut d = drive(
            vec![
                Round::new(RoundName::Coding1, 30),
                Round::new(RoundName::Bps, 30).elimination(),
            ],
            vec![candidate("c@x.io", "4")],
            vec![interviewer(
                "i@x.io",
                "5A",
                &[RoundName::Bps, RoundName::Coding1],
                3,
                (now, at(12, 0)),
            )],
        );
        let rounds = eligible_rounds(&d.candidates[0], &d);
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].name, RoundName::Bps);

        refresh_statuses(&mut d, now);
        let events = schedule_interviews(&mut d, now);
        assert_eq!(events[0].round.name, RoundName::Bps);
    }

    #[test]
    fn test_unfinished_elimination_blocks_candidate() {
        let mut d = drive(
            vec![
                Round::new(RoundName::Bps, 30).elimination(),
                Round::new(RoundName::Coding1, 30),
            ],
            vec![candidate("c@x.io", "4")],
            vec![],
        );
        let event = Event::new(d.id, d.rounds[0].clone(), "c@x.io", "i@x.io", at(9, 0));
        d.events.push(event);
        assert!(eligible_rounds(&d.candidates[0], &d).is_empty());

        d.events[0].status = EventStatus::Completed;
        d.events[0].decision = Decision::Yes;
        let rounds = eligible_rounds(&d.candidates[0], &d);
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].name, RoundName::Coding1);
    }

    #[test]
    fn test_failed_elimination_stops_further_rounds() {
        let now = at(10, 0);
        let mut d = drive(
            vec![
                Round::new(RoundName::Bps, 30).elimination(),
                Round::new(RoundName::Coding1, 30),
            ],
            vec![candidate("c@x.io", "4")],
            vec![interviewer("j@x.io", "5A", &[RoundName::Coding1], 3, (now, at(12, 0)))],
        );
        complete(&mut d, RoundName::Bps, "c@x.io", "i@x.io", at(9, 0), Decision::No);
        refresh_statuses(&mut d, now);
        assert!(schedule_interviews(&mut d, now).is_empty());
        assert_eq!(d.candidates[0].overall_decision, Decision::No);
    }

    #[test]
    fn test_equal_starts_prefer_lower_utilisation() {
        let now = at(9, 0);
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30), Round::new(RoundName::Coding1, 30)],
            vec![candidate("c@x.io", "4"), candidate("d@x.io", "4")],
            vec![
                interviewer(
                    "busy@x.io",
                    "5A",
                    &[RoundName::Bps, RoundName::Coding1],
                    4,
                    (now, at(12, 0)),
                ),
                interviewer(
                    "idle@x.io",
                    "5A",
                    &[RoundName::Bps, RoundName::Coding1],
                    4,
                    (now, at(12, 0)),
                ),
            ],
        );
        // An afternoon booking leaves the morning free but raises utilisation.
        let afternoon = Event::new(d.id, d.rounds[1].clone(), "z@x.io", "busy@x.io", at(11, 30));
        d.events.push(afternoon);
        refresh_statuses(&mut d, now);

        let events = schedule_interviews(&mut d, now);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].candidate_email, "c@x.io");
        assert_eq!(events[0].interviewer_email, "idle@x.io");
        assert_eq!(events[1].candidate_email, "d@x.io");
        assert_eq!(events[1].interviewer_email, "busy@x.io");
        assert_eq!(events[1].start_time, at(9, 15));
    }

    #[test]
    fn test_same_pair_is_never_scheduled_twice() {
        let now = at(9, 0);
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30), Round::new(RoundName::Coding1, 30)],
            vec![candidate("c@x.io", "4")],
            vec![interviewer(
                "i@x.io",
                "5A",
                &[RoundName::Bps, RoundName::Coding1],
                3,
                (now, at(12, 0)),
            )],
        );
        refresh_statuses(&mut d, now);
        assert_eq!(schedule_interviews(&mut d, now).len(), 1);

        d.events[0].status = EventStatus::Completed;
        d.events[0].decision = Decision::Yes;
        refresh_statuses(&mut d, at(9, 50));
        assert!(schedule_interviews(&mut d, at(9, 50)).is_empty());
    }

    #[test]
    fn test_busy_candidate_is_skipped() {
        let now = at(9, 0);
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30), Round::new(RoundName::Coding1, 30)],
            vec![candidate("c@x.io", "4")],
            vec![interviewer(
                "i@x.io",
                "5A",
                &[RoundName::Bps, RoundName::Coding1],
                3,
                (now, at(12, 0)),
            )],
        );
        let mut ongoing = Event::new(d.id, d.rounds[0].clone(), "c@x.io", "x@x.io", at(8, 45));
        ongoing.status = EventStatus::Ongoing;
        d.events.push(ongoing);
        refresh_statuses(&mut d, now);
        assert!(schedule_interviews(&mut d, now).is_empty());
    }
}
