// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Scheduling and status rules live in domains/drives and call through these.
//
// Naming convention: Base* for trait names (e.g., BaseNotifier, BaseClock)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::drives::models::{Candidate, Event, Interviewer};

// =============================================================================
// Notification Trait (Infrastructure - delivery is external)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRole {
    Candidate,
    Interviewer,
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub name: String,
    pub role: RecipientRole,
}

impl From<&Candidate> for Recipient {
    fn from(candidate: &Candidate) -> Self {
        Self {
            email: candidate.email.clone(),
            name: candidate.name.clone(),
            role: RecipientRole::Candidate,
        }
    }
}

impl From<&Interviewer> for Recipient {
    fn from(interviewer: &Interviewer) -> Self {
        Self {
            email: interviewer.email.clone(),
            name: interviewer.name.clone(),
            role: RecipientRole::Interviewer,
        }
    }
}

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    /// A new interview was booked for this participant
    async fn notify_scheduled(&self, event: &Event, recipient: &Recipient) -> Result<()>;

    /// The interview moved to ONGOING
    async fn notify_start(&self, event: &Event, interviewer: &Recipient) -> Result<()>;

    /// Ask the interviewer for feedback
    async fn notify_complete(&self, event: &Event, interviewer: &Recipient) -> Result<()>;
}

// =============================================================================
// Clock Trait (Infrastructure)
// =============================================================================

/// Source of "now". Actions read it once per attempt and hand the value to
/// the engines.
pub trait BaseClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl BaseClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
