//! Pure engines over a drive snapshot. No I/O, no clock reads, no randomness.

pub mod scheduler;
pub mod status;

pub use scheduler::{earliest_slot, eligible_rounds, schedule_interviews, SCHEDULING_BUFFER_MINUTES};
pub use status::{
    candidate_overall_decision, candidate_status, interviewer_status, refresh_statuses,
    RefreshReport,
};
