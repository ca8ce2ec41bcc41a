//! Notification side effects. Emitted only after the drive was saved.

use tracing::warn;

use crate::domains::drives::models::{Drive, Event};
use crate::kernel::{Recipient, ServerDeps};

/// Tells both participants about each new interview.
pub fn announce_scheduled(drive: &Drive, events: &[Event], deps: &ServerDeps) {
    for event in events {
        match drive.candidate(&event.candidate_email) {
            Some(candidate) => deps
                .notifications
                .scheduled(event, Recipient::from(candidate)),
            None => warn!(event_id = %event.id, email = %event.candidate_email, "candidate missing from drive"),
        }
        if let Some(recipient) = interviewer_recipient(drive, event) {
            deps.notifications.scheduled(event, recipient);
        }
    }
}

/// Interview moved to ONGOING.
pub fn announce_start(drive: &Drive, event: &Event, deps: &ServerDeps) {
    if let Some(recipient) = interviewer_recipient(drive, event) {
        deps.notifications.start(event, recipient);
    }
}

/// Ask the interviewer for feedback on an interview that should be over.
pub fn request_feedback(drive: &Drive, event: &Event, deps: &ServerDeps) {
    if let Some(recipient) = interviewer_recipient(drive, event) {
        deps.notifications.complete(event, recipient);
    }
}

fn interviewer_recipient(drive: &Drive, event: &Event) -> Option<Recipient> {
    let recipient = drive.interviewer(&event.interviewer_email).map(Recipient::from);
    if recipient.is_none() {
        warn!(event_id = %event.id, email = %event.interviewer_email, "interviewer missing from drive");
    }
    recipient
}
