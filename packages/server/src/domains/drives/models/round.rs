use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed set of interview stages a drive can contain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundName {
    Bps,
    Coding1,
    Coding2,
    BarRaiser,
    HiringManager,
}

impl RoundName {
    pub const ALL: [RoundName; 5] = [
        RoundName::Bps,
        RoundName::Coding1,
        RoundName::Coding2,
        RoundName::BarRaiser,
        RoundName::HiringManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundName::Bps => "BPS",
            RoundName::Coding1 => "CODING1",
            RoundName::Coding2 => "CODING2",
            RoundName::BarRaiser => "BAR_RAISER",
            RoundName::HiringManager => "HIRING_MANAGER",
        }
    }
}

impl fmt::Display for RoundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        RoundName::ALL
            .into_iter()
            .find(|name| name.as_str() == wanted)
            .ok_or_else(|| format!("unknown round name: {}", s))
    }
}

/// One interview stage of a drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub name: RoundName,
    pub duration_minutes: u32,
    /// A failing decision in this round ends the candidate's drive.
    pub is_elimination: bool,
    pub is_job_family_matching_required: bool,
}

impl Round {
    pub fn new(name: RoundName, duration_minutes: u32) -> Self {
        Self {
            name,
            duration_minutes,
            is_elimination: false,
            is_job_family_matching_required: false,
        }
    }

    pub fn elimination(mut self) -> Self {
        self.is_elimination = true;
        self
    }

    pub fn job_family_matched(mut self) -> Self {
        self.is_job_family_matching_required = true;
        self
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}
