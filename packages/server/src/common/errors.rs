use thiserror::Error;

use super::{DriveId, EventId};

/// Errors surfaced by drive operations.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Drive not found: {drive_id}")]
    DriveNotFound { drive_id: DriveId },

    #[error("Event {event_id} not found in drive {drive_id}")]
    EventNotFound { drive_id: DriveId, event_id: EventId },

    #[error("Participant not found: {email}")]
    ParticipantNotFound { email: String },

    #[error("Version conflict on drive {drive_id}: expected {expected}, found {actual}")]
    VersionConflict {
        drive_id: DriveId,
        expected: i64,
        actual: i64,
    },

    #[error("Gave up saving drive {drive_id} after {attempts} attempts")]
    RetriesExhausted { drive_id: DriveId, attempts: u32 },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DriveError {
    pub fn validation(message: impl Into<String>) -> Self {
        DriveError::Validation(message.into())
    }

    /// Whether the caller may retry the whole operation.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DriveError::VersionConflict { .. }
                | DriveError::RetriesExhausted { .. }
                | DriveError::Database(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DriveError::DriveNotFound { .. }
                | DriveError::EventNotFound { .. }
                | DriveError::ParticipantNotFound { .. }
        )
    }
}

pub type DriveResult<T> = std::result::Result<T, DriveError>;
