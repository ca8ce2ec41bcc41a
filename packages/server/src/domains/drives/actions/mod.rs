//! Drive actions - the public operations.
//!
//! Every action that changes a drive goes through [`mutate_drive`]; side
//! effects (notifications, deferred tasks) run only after the write landed.

pub mod create_drive;
pub mod mutate;
pub mod notification_response;
pub mod queries;
pub mod record_outcome;
pub mod stats;
pub mod trigger_scheduling;

pub use create_drive::create_drive;
pub use mutate::{mutate_drive, Mutation};
pub use notification_response::{
    respond_to_notification, NotificationResponse, ResponseHandled, ResponseKind,
};
pub use queries::{get_drive, list_drives};
pub use record_outcome::{record_event_outcome, EventOutcome, OutcomeRecorded, MAX_BREAK_MINUTES};
pub use stats::{get_stats, DriveStats};
pub use trigger_scheduling::{trigger_scheduling, SchedulingOutcome};
