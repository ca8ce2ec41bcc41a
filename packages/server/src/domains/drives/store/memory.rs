//! In-process drive store for tests and database-less runs.
//!
//! No durability and no cross-process coordination.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};

use anyhow::anyhow;
use async_trait::async_trait;

use super::{DriveStore, SaveOutcome};
use crate::common::{DriveError, DriveId, DriveResult};
use crate::domains::drives::models::Drive;

#[derive(Debug, Default)]
pub struct InMemoryDriveStore {
    drives: RwLock<HashMap<DriveId, Drive>>,
    /// Number of upcoming saves to reject as conflicts.
    injected_conflicts: AtomicU32,
}

fn poison_err<T>(_: PoisonError<T>) -> DriveError {
    DriveError::Internal(anyhow!("drive store lock poisoned"))
}

impl InMemoryDriveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` saves report a conflict, as if another writer
    /// had won the race each time.
    pub fn inject_conflicts(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    pub fn len(&self) -> DriveResult<usize> {
        Ok(self.drives.read().map_err(poison_err)?.len())
    }

    pub fn is_empty(&self) -> DriveResult<bool> {
        Ok(self.len()? == 0)
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DriveStore for InMemoryDriveStore {
    async fn insert(&self, drive: &Drive) -> DriveResult<i64> {
        let mut drives = self.drives.write().map_err(poison_err)?;
        if drives.contains_key(&drive.id) {
            return Err(DriveError::validation(format!(
                "drive {} already exists",
                drive.id
            )));
        }
        let mut stored = drive.clone();
        stored.version = 1;
        drives.insert(drive.id, stored);
        Ok(1)
    }

    async fn find(&self, drive_id: DriveId) -> DriveResult<Option<Drive>> {
        let drives = self.drives.read().map_err(poison_err)?;
        Ok(drives.get(&drive_id).cloned())
    }

    async fn list(&self) -> DriveResult<Vec<Drive>> {
        let drives = self.drives.read().map_err(poison_err)?;
        let mut all: Vec<Drive> = drives.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.as_uuid().cmp(a.id.as_uuid())));
        Ok(all)
    }

    async fn save(&self, drive: &Drive, expected_version: i64) -> DriveResult<SaveOutcome> {
        let mut drives = self.drives.write().map_err(poison_err)?;
        let Some(current) = drives.get_mut(&drive.id) else {
            return Ok(SaveOutcome::NotFound);
        };

        if self.take_injected_conflict() {
            return Ok(SaveOutcome::Conflict {
                actual: current.version,
            });
        }
        if current.version != expected_version {
            return Ok(SaveOutcome::Conflict {
                actual: current.version,
            });
        }

        let version = expected_version + 1;
        *current = drive.clone();
        current.version = version;
        Ok(SaveOutcome::Saved { version })
    }
}
