//! Drive persistence.
//!
//! One versioned document per drive. Writes are compare-and-swap on the
//! version: `save` only lands if the stored version still equals the version
//! the caller read.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use super::models::Drive;
use crate::common::{DriveId, DriveResult};

pub use memory::InMemoryDriveStore;
pub use postgres::PostgresDriveStore;

/// Result of a version-checked write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written; the record now has `version`.
    Saved { version: i64 },
    /// Someone else wrote first.
    Conflict { actual: i64 },
    /// No record with that id.
    NotFound,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

#[async_trait]
pub trait DriveStore: Send + Sync {
    /// Stores a new drive and returns its initial version.
    async fn insert(&self, drive: &Drive) -> DriveResult<i64>;

    /// Loads a drive with `version` set from storage.
    async fn find(&self, drive_id: DriveId) -> DriveResult<Option<Drive>>;

    /// All drives, newest first.
    async fn list(&self) -> DriveResult<Vec<Drive>>;

    /// Replaces the stored drive if its version still equals `expected_version`.
    async fn save(&self, drive: &Drive, expected_version: i64) -> DriveResult<SaveOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_outcome_is_saved() {
        assert!(SaveOutcome::Saved { version: 2 }.is_saved());
        assert!(!SaveOutcome::Conflict { actual: 3 }.is_saved());
        assert!(!SaveOutcome::NotFound.is_saved());
    }
}
