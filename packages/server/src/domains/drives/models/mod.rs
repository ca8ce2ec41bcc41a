pub mod drive;
pub mod event;
pub mod participant;
pub mod round;

pub use drive::{Drive, NewDrive};
pub use event::{Event, EventLinks, EventStatus};
pub use participant::{seniority_tier, Candidate, Decision, Interviewer, ParticipantStatus};
pub use round::{Round, RoundName};
