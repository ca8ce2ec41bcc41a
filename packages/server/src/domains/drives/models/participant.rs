use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::round::RoundName;

// ============================================================================
// Enums
// ============================================================================

/// Interview outcome. Used both per event and as a candidate's overall result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    #[default]
    Pending,
    StrongNo,
    No,
    Yes,
    StrongYes,
}

impl Decision {
    pub fn is_pending(&self) -> bool {
        matches!(self, Decision::Pending)
    }

    /// YES or STRONG_YES.
    pub fn is_positive(&self) -> bool {
        matches!(self, Decision::Yes | Decision::StrongYes)
    }

    /// NO or STRONG_NO.
    pub fn is_negative(&self) -> bool {
        matches!(self, Decision::No | Decision::StrongNo)
    }
}

/// Live status of a candidate or interviewer, derived on every trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    #[default]
    Waiting,
    Busy,
    Done,
}

/// Ordinal rank of a seniority label.
///
/// Labels low to high: "3", "4", "5A", "5B", "6". Anything else ranks 0.
pub fn seniority_tier(level: &str) -> u8 {
    match level.trim().to_ascii_uppercase().as_str() {
        "3" => 1,
        "4" => 2,
        "5A" => 3,
        "5B" => 4,
        "6" => 5,
        _ => 0,
    }
}

// ============================================================================
// Candidate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub email: String,
    pub name: String,
    #[builder(default)]
    #[serde(default)]
    pub resume: String,
    pub job_family: String,
    pub level: String,
    #[builder(default)]
    #[serde(default)]
    pub overall_decision: Decision,
    #[builder(default)]
    #[serde(default)]
    pub current_status: ParticipantStatus,
}

impl Candidate {
    pub fn tier(&self) -> u8 {
        seniority_tier(&self.level)
    }
}

// ============================================================================
// Interviewer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
#[serde(rename_all = "camelCase")]
pub struct Interviewer {
    pub email: String,
    pub name: String,
    pub job_family: String,
    pub level: String,
    /// Rounds this interviewer may conduct.
    pub eligible_rounds: BTreeSet<RoundName>,
    pub max_interviews: u32,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    #[builder(default)]
    #[serde(default)]
    pub current_status: ParticipantStatus,
    /// Set while the interviewer is on a requested break.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_until: Option<DateTime<Utc>>,
}

impl Interviewer {
    pub fn tier(&self) -> u8 {
        seniority_tier(&self.level)
    }

    pub fn is_eligible_for(&self, round: RoundName) -> bool {
        self.eligible_rounds.contains(&round)
    }

    pub fn is_on_break(&self, now: DateTime<Utc>) -> bool {
        self.break_until.is_some_and(|until| now < until)
    }
}
