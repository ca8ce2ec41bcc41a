//! Status engine.
//!
//! Participant statuses and candidate outcomes are derived from the drive's
//! events and the supplied `now`; nothing cached on the record is trusted.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domains::drives::models::{
    Candidate, Decision, Drive, Event, Interviewer, ParticipantStatus,
};

/// Share of YES-equivalent rounds (in tenths) needed for an overall YES.
const YES_THRESHOLD_TENTHS: usize = 7;

pub fn interviewer_status(
    interviewer: &Interviewer,
    drive: &Drive,
    now: DateTime<Utc>,
) -> ParticipantStatus {
    if now < interviewer.slot_start {
        return ParticipantStatus::Busy;
    }
    if now > interviewer.slot_end {
        return ParticipantStatus::Done;
    }

    let completed = drive
        .events_for_interviewer(&interviewer.email)
        .filter(|e| e.is_completed())
        .count();
    if completed >= interviewer.max_interviews as usize {
        return ParticipantStatus::Done;
    }

    if drive.all_candidates_decided() {
        return ParticipantStatus::Done;
    }

    if drive
        .events_for_interviewer(&interviewer.email)
        .any(Event::is_ongoing)
    {
        return ParticipantStatus::Busy;
    }

    if interviewer.is_on_break(now) {
        return ParticipantStatus::Busy;
    }

    ParticipantStatus::Waiting
}

pub fn candidate_status(candidate: &Candidate, drive: &Drive) -> ParticipantStatus {
    if !candidate.overall_decision.is_pending() {
        return ParticipantStatus::Done;
    }
    if drive
        .events_for_candidate(&candidate.email)
        .any(Event::is_ongoing)
    {
        return ParticipantStatus::Busy;
    }
    ParticipantStatus::Waiting
}

/// Outcome implied by the candidate's completed interviews.
///
/// A failed elimination round is final. Otherwise the candidate stays PENDING
/// until every round has a completed interview, then YES-equivalents decide:
/// all of them gives STRONG_YES, at least 70% gives YES, anything less NO.
/// A completed interview still waiting for its verdict covers nothing.
pub fn candidate_overall_decision(candidate: &Candidate, drive: &Drive) -> Decision {
    let completed: Vec<&Event> = drive
        .events_for_candidate(&candidate.email)
        .filter(|e| e.is_completed() && !e.decision.is_pending())
        .collect();

    let failed_elimination = completed
        .iter()
        .any(|e| is_elimination_round(drive, e) && e.decision.is_negative());
    if failed_elimination {
        return Decision::No;
    }

    let covered: HashSet<_> = completed.iter().map(|e| e.round.name).collect();
    if !drive.rounds.iter().all(|r| covered.contains(&r.name)) {
        return Decision::Pending;
    }

    let yes = completed.iter().filter(|e| e.decision.is_positive()).count();
    let total = drive.rounds.len();

    if yes == total {
        Decision::StrongYes
    } else if yes * 10 >= total * YES_THRESHOLD_TENTHS {
        Decision::Yes
    } else {
        Decision::No
    }
}

/// The drive's round definition wins over the snapshot copied into the event.
fn is_elimination_round(drive: &Drive, event: &Event) -> bool {
    drive
        .rounds
        .iter()
        .find(|r| r.name == event.round.name)
        .map_or(event.round.is_elimination, |r| r.is_elimination)
}

/// Candidates whose outcome became final during a refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub decided: Vec<(String, Decision)>,
}

/// Re-derives every status on the record for `now`.
///
/// Outcomes go first (and only for PENDING candidates, so a final outcome never
/// changes), then candidate statuses, then interviewer statuses since those
/// depend on whether every candidate is decided.
pub fn refresh_statuses(drive: &mut Drive, now: DateTime<Utc>) -> RefreshReport {
    let mut report = RefreshReport::default();

    let decisions: Vec<Decision> = drive
        .candidates
        .iter()
        .map(|c| {
            if c.overall_decision.is_pending() {
                candidate_overall_decision(c, drive)
            } else {
                c.overall_decision
            }
        })
        .collect();
    for (candidate, decision) in drive.candidates.iter_mut().zip(decisions) {
        if candidate.overall_decision.is_pending() && !decision.is_pending() {
            report.decided.push((candidate.email.clone(), decision));
            candidate.overall_decision = decision;
        }
    }

    let candidate_statuses: Vec<ParticipantStatus> = drive
        .candidates
        .iter()
        .map(|c| candidate_status(c, drive))
        .collect();
    for (candidate, status) in drive.candidates.iter_mut().zip(candidate_statuses) {
        candidate.current_status = status;
    }

    let interviewer_statuses: Vec<ParticipantStatus> = drive
        .interviewers
        .iter()
        .map(|i| interviewer_status(i, drive, now))
        .collect();
    for (interviewer, status) in drive.interviewers.iter_mut().zip(interviewer_statuses) {
        interviewer.current_status = status;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::drives::models::{EventStatus, Round, RoundName};
    use crate::domains::drives::testing::*;

    fn five_rounds() -> Vec<Round> {
        RoundName::ALL
            .into_iter()
            .map(|name| Round::new(name, 30))
            .collect()
    }

    #[test]
    fn test_interviewer_busy_before_slot_and_done_after() {
        let i = interviewer("i@x.io", "5A", &[RoundName::Bps], 3, (at(10, 0), at(12, 0)));
        let d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("c@x.io", "4")],
            vec![i.clone()],
        );
        assert_eq!(interviewer_status(&i, &d, at(9, 59)), ParticipantStatus::Busy);
        assert_eq!(interviewer_status(&i, &d, at(10, 0)), ParticipantStatus::Waiting);
        assert_eq!(interviewer_status(&i, &d, at(12, 0)), ParticipantStatus::Waiting);
        assert_eq!(interviewer_status(&i, &d, at(12, 1)), ParticipantStatus::Done);
    }

    #[test]
    fn test_interviewer_done_at_completed_capacity() {
        let i = interviewer("i@x.io", "5A", &[RoundName::Bps], 1, (at(9, 0), at(12, 0)));
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30), Round::new(RoundName::Coding1, 30)],
            vec![candidate("c@x.io", "4")],
            vec![i.clone()],
        );
        complete(&mut d, RoundName::Bps, "c@x.io", "i@x.io", at(9, 0), Decision::Yes);
        assert_eq!(interviewer_status(&i, &d, at(10, 0)), ParticipantStatus::Done);
    }

    #[test]
    fn test_interviewer_done_when_every_candidate_decided() {
        let i = interviewer("i@x.io", "5A", &[RoundName::Bps], 3, (at(9, 0), at(12, 0)));
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("c@x.io", "4")],
            vec![i.clone()],
        );
        d.candidates[0].overall_decision = Decision::No;
        assert_eq!(interviewer_status(&i, &d, at(10, 0)), ParticipantStatus::Done);
    }

    #[test]
    fn test_interviewer_busy_while_ongoing_or_on_break() {
        let mut i = interviewer("i@x.io", "5A", &[RoundName::Bps], 3, (at(9, 0), at(12, 0)));
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30), Round::new(RoundName::Coding1, 30)],
            vec![candidate("c@x.io", "4")],
            vec![i.clone()],
        );
        let mut event = Event::new(d.id, d.rounds[0].clone(), "c@x.io", "i@x.io", at(9, 30));
        event.status = EventStatus::Ongoing;
        d.events.push(event);
        assert_eq!(interviewer_status(&i, &d, at(9, 40)), ParticipantStatus::Busy);

        d.events[0].status = EventStatus::Completed;
        i.break_until = Some(at(10, 15));
        assert_eq!(interviewer_status(&i, &d, at(10, 0)), ParticipantStatus::Busy);
        assert_eq!(interviewer_status(&i, &d, at(10, 15)), ParticipantStatus::Waiting);
    }

    #[test]
    fn test_candidate_status() {
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("c@x.io", "4")],
            vec![],
        );
        assert_eq!(candidate_status(&d.candidates[0], &d), ParticipantStatus::Waiting);

        let mut event = Event::new(d.id, d.rounds[0].clone(), "c@x.io", "i@x.io", at(9, 0));
        event.status = EventStatus::Ongoing;
        d.events.push(event);
        assert_eq!(candidate_status(&d.candidates[0], &d), ParticipantStatus::Busy);

        d.candidates[0].overall_decision = Decision::Yes;
        assert_eq!(candidate_status(&d.candidates[0], &d), ParticipantStatus::Done);
    }

    #[test]
    fn test_four_of_five_yes_is_yes() {
        let mut d = drive(five_rounds(), vec![candidate("c@x.io", "4")], vec![]);
        let decisions = [
            Decision::Yes,
            Decision::StrongYes,
            Decision::Yes,
            Decision::Yes,
            Decision::No,
        ];
        for (n, (name, decision)) in RoundName::ALL.into_iter().zip(decisions).enumerate() {
            let interviewer = format!("i{n}@x.io");
            complete(&mut d, name, "c@x.io", &interviewer, at(9 + n as u32, 0), decision);
        }
        assert_eq!(candidate_overall_decision(&d.candidates[0], &d), Decision::Yes);
    }

    #[test]
    fn test_all_yes_is_strong_yes_and_three_of_five_is_no() {
        let mut d = drive(five_rounds(), vec![candidate("c@x.io", "4")], vec![]);
        for (n, name) in RoundName::ALL.into_iter().enumerate() {
            let interviewer = format!("i{n}@x.io");
            complete(&mut d, name, "c@x.io", &interviewer, at(9 + n as u32, 0), Decision::Yes);
        }
        assert_eq!(candidate_overall_decision(&d.candidates[0], &d), Decision::StrongYes);

        d.events[3].decision = Decision::No;
        d.events[4].decision = Decision::StrongNo;
        assert_eq!(candidate_overall_decision(&d.candidates[0], &d), Decision::No);
    }

    #[test]
    fn test_pending_until_every_round_completed() {
        let mut d = drive(five_rounds(), vec![candidate("c@x.io", "4")], vec![]);
        complete(&mut d, RoundName::Bps, "c@x.io", "i@x.io", at(9, 0), Decision::Yes);
        assert_eq!(candidate_overall_decision(&d.candidates[0], &d), Decision::Pending);
    }

    #[test]
    fn test_completed_without_verdict_stays_pending() {
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("c@x.io", "4")],
            vec![],
        );
        complete(&mut d, RoundName::Bps, "c@x.io", "i@x.io", at(9, 0), Decision::Pending);
        assert_eq!(candidate_overall_decision(&d.candidates[0], &d), Decision::Pending);

        d.events[0].decision = Decision::StrongYes;
        assert_eq!(candidate_overall_decision(&d.candidates[0], &d), Decision::StrongYes);
    }

    #[test]
    fn test_failed_elimination_is_final_no() {
        let rounds = vec![
            Round::new(RoundName::Bps, 30).elimination(),
            Round::new(RoundName::Coding1, 30),
        ];
        let mut d = drive(rounds, vec![candidate("c@x.io", "4")], vec![]);
        complete(&mut d, RoundName::Bps, "c@x.io", "i@x.io", at(9, 0), Decision::StrongNo);
        assert_eq!(candidate_overall_decision(&d.candidates[0], &d), Decision::No);
    }

    #[test]
    fn test_refresh_never_changes_a_final_outcome() {
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("c@x.io", "4")],
            vec![],
        );
        complete(&mut d, RoundName::Bps, "c@x.io", "i@x.io", at(9, 0), Decision::Yes);

        let report = refresh_statuses(&mut d, at(10, 0));
        assert_eq!(report.decided, vec![("c@x.io".to_string(), Decision::StrongYes)]);
        assert_eq!(d.candidates[0].current_status, ParticipantStatus::Done);

        d.events[0].decision = Decision::No;
        let report = refresh_statuses(&mut d, at(10, 5));
        assert!(report.decided.is_empty());
        assert_eq!(d.candidates[0].overall_decision, Decision::StrongYes);
    }
}
