use crate::common::{DriveError, DriveId, DriveResult};
use crate::domains::drives::models::Drive;
use crate::kernel::ServerDeps;

pub async fn get_drive(drive_id: DriveId, deps: &ServerDeps) -> DriveResult<Drive> {
    deps.store
        .find(drive_id)
        .await?
        .ok_or(DriveError::DriveNotFound { drive_id })
}

/// Newest first.
pub async fn list_drives(deps: &ServerDeps) -> DriveResult<Vec<Drive>> {
    deps.store.list().await
}
