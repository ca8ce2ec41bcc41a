pub mod notify;
pub mod timers;

pub use notify::{announce_scheduled, announce_start, request_feedback};
pub use timers::{arm_break_over, arm_feedback_due, arm_slot_openings};
