//! Typed ID definitions for the drive domain.

pub use super::id::{Id, V5, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Drive records (one hiring event).
pub struct DriveRecord;

/// Marker type for interview events inside a drive.
pub struct InterviewEvent;

/// Marker type for durable deferred tasks.
pub struct DeferredTaskRecord;

// ============================================================================
// Type aliases
// ============================================================================

/// Typed ID for drives.
pub type DriveId = Id<DriveRecord>;

/// Typed ID for interview events. Name-based, see `Event::id_for`.
pub type EventId = Id<InterviewEvent, V5>;

/// Typed ID for deferred tasks.
pub type TaskId = Id<DeferredTaskRecord>;
