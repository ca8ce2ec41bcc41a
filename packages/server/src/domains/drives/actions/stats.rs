use serde::Serialize;

use crate::common::{DriveId, DriveResult};
use crate::domains::drives::models::{Decision, Drive, EventStatus};
use crate::kernel::ServerDeps;

/// Dashboard aggregates for one drive. Percentages are 0-100 with two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveStats {
    pub total_candidates: usize,
    pub total_interviewers: usize,
    pub ongoing_interviews: usize,
    pub candidates_pending_decision: usize,
    pub percent_completed: f64,
    pub percent_selected: f64,
}

impl DriveStats {
    pub fn from_drive(drive: &Drive) -> Self {
        let total = drive.candidates.len();
        let pending = drive
            .candidates
            .iter()
            .filter(|c| c.overall_decision.is_pending())
            .count();
        let selected = drive
            .candidates
            .iter()
            .filter(|c| matches!(c.overall_decision, Decision::Yes | Decision::StrongYes))
            .count();

        Self {
            total_candidates: total,
            total_interviewers: drive.interviewers.len(),
            ongoing_interviews: drive
                .events
                .iter()
                .filter(|e| e.status == EventStatus::Ongoing)
                .count(),
            candidates_pending_decision: pending,
            percent_completed: percent(total - pending, total),
            percent_selected: percent(selected, total),
        }
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = part as f64 * 100.0 / total as f64;
    (raw * 100.0).round() / 100.0
}

pub async fn get_stats(drive_id: DriveId, deps: &ServerDeps) -> DriveResult<DriveStats> {
    let drive = super::get_drive(drive_id, deps).await?;
    Ok(DriveStats::from_drive(&drive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::drives::models::{Event, Round, RoundName};
    use crate::domains::drives::testing::*;

    #[test]
    fn test_percentages_round_to_two_decimals() {
        assert_eq!(percent(1, 3), 33.33);
        assert_eq!(percent(2, 3), 66.67);
        assert_eq!(percent(0, 0), 0.0);
    }

    #[test]
    fn test_stats_from_drive() {
        let mut d = drive(
            vec![Round::new(RoundName::Bps, 30)],
            vec![candidate("a@x.io", "4"), candidate("b@x.io", "4"), candidate("c@x.io", "4")],
            vec![interviewer("i@x.io", "5A", &[RoundName::Bps], 3, (at(9, 0), at(12, 0)))],
        );
        d.candidates[0].overall_decision = Decision::StrongYes;
        d.candidates[1].overall_decision = Decision::No;
        let mut ongoing = Event::new(d.id, d.rounds[0].clone(), "c@x.io", "i@x.io", at(9, 30));
        ongoing.status = EventStatus::Ongoing;
        d.events.push(ongoing);

        let stats = DriveStats::from_drive(&d);
        assert_eq!(
            stats,
            DriveStats {
                total_candidates: 3,
                total_interviewers: 1,
                ongoing_interviews: 1,
                candidates_pending_decision: 1,
                percent_completed: 66.67,
                percent_selected: 33.33,
            }
        );
    }
}
