//! Read-modify-write with optimistic concurrency.
//!
//! Every drive mutation goes through [`mutate_drive`]: load the current record,
//! apply a synchronous transform for a freshly read `now`, and save with a
//! version check. A conflict throws the attempt away and starts over from a
//! fresh read, so the transform must only touch the drive it is handed.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::common::{DriveError, DriveId, DriveResult};
use crate::domains::drives::models::Drive;
use crate::domains::drives::store::SaveOutcome;
use crate::kernel::ServerDeps;

/// The saved drive and whatever the transform returned.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    pub drive: Drive,
    pub output: T,
    /// False when the transform left the record untouched and no write happened.
    pub changed: bool,
    pub now: DateTime<Utc>,
}

pub async fn mutate_drive<T, F>(
    drive_id: DriveId,
    deps: &ServerDeps,
    mut apply: F,
) -> DriveResult<Mutation<T>>
where
    F: FnMut(&mut Drive, DateTime<Utc>) -> DriveResult<T>,
{
    let policy = deps.retry;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let original = deps
            .store
            .find(drive_id)
            .await?
            .ok_or(DriveError::DriveNotFound { drive_id })?;
        let expected_version = original.version;
        let now = deps.clock.now();

        let mut drive = original.clone();
        let output = apply(&mut drive, now)?;

        if drive == original {
            return Ok(Mutation {
                drive,
                output,
                changed: false,
                now,
            });
        }

        drive.updated_at = now;
        match deps.store.save(&drive, expected_version).await? {
            SaveOutcome::Saved { version } => {
                debug!(drive_id = %drive_id, version, attempt, "drive saved");
                drive.version = version;
                return Ok(Mutation {
                    drive,
                    output,
                    changed: true,
                    now,
                });
            }
            SaveOutcome::NotFound => return Err(DriveError::DriveNotFound { drive_id }),
            SaveOutcome::Conflict { actual } => {
                if attempt >= policy.max_attempts {
                    warn!(
                        drive_id = %drive_id,
                        expected = expected_version,
                        actual,
                        attempts = attempt,
                        "giving up after repeated version conflicts"
                    );
                    return Err(DriveError::RetriesExhausted {
                        drive_id,
                        attempts: attempt,
                    });
                }

                let delay = policy.backoff(attempt);
                debug!(
                    drive_id = %drive_id,
                    expected = expected_version,
                    actual,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "version conflict, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
