//! Create drive action

use tracing::info;

use crate::common::DriveResult;
use crate::domains::drives::effects::{announce_scheduled, arm_slot_openings};
use crate::domains::drives::machines::{refresh_statuses, schedule_interviews};
use crate::domains::drives::models::{Drive, NewDrive};
use crate::kernel::ServerDeps;

/// Validate the input, persist the drive and run the first scheduling pass.
///
/// The first pass happens before the initial insert, so a new drive never
/// needs a second write. Slot-opening timers are armed for interviewers whose
/// availability starts later.
pub async fn create_drive(input: NewDrive, deps: &ServerDeps) -> DriveResult<Drive> {
    input.validate()?;

    let now = deps.clock.now();
    let mut drive = Drive::from_new(input, now)?;

    refresh_statuses(&mut drive, now);
    let scheduled = schedule_interviews(&mut drive, now);

    drive.version = deps.store.insert(&drive).await?;

    info!(
        drive_id = %drive.id,
        name = %drive.name,
        rounds = drive.rounds.len(),
        candidates = drive.candidates.len(),
        interviewers = drive.interviewers.len(),
        scheduled = scheduled.len(),
        "drive created"
    );

    arm_slot_openings(&drive, now, deps).await;
    announce_scheduled(&drive, &scheduled, deps);

    Ok(drive)
}
