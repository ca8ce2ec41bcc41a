//! Fire-and-forget notification dispatch.
//!
//! Engine code hands events to [`NotificationDispatcher`] and moves on.
//! Each delivery runs on its own task; a failure is logged and dropped.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::traits::{BaseNotifier, Recipient};
use crate::domains::drives::models::Event;

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn BaseNotifier>,
    tracker: TaskTracker,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn BaseNotifier>) -> Self {
        Self {
            notifier,
            tracker: TaskTracker::new(),
        }
    }

    pub fn scheduled(&self, event: &Event, recipient: Recipient) {
        let notifier = self.notifier.clone();
        let event = event.clone();
        self.spawn("scheduled", async move {
            notifier.notify_scheduled(&event, &recipient).await
        });
    }

    pub fn start(&self, event: &Event, interviewer: Recipient) {
        let notifier = self.notifier.clone();
        let event = event.clone();
        self.spawn("start", async move {
            notifier.notify_start(&event, &interviewer).await
        });
    }

    pub fn complete(&self, event: &Event, interviewer: Recipient) {
        let notifier = self.notifier.clone();
        let event = event.clone();
        self.spawn("complete", async move {
            notifier.notify_complete(&event, &interviewer).await
        });
    }

    /// Waits for every delivery spawned so far.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    fn spawn<F>(&self, kind: &'static str, delivery: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.tracker.spawn(async move {
            match delivery.await {
                Ok(()) => debug!(kind, "notification delivered"),
                Err(e) => warn!(kind, error = %e, "notification delivery failed"),
            }
        });
    }
}

// =============================================================================
// Logging Notifier (default gateway)
// =============================================================================

/// Renders notifications as log lines. Stands in until a real channel
/// (email, chat) is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl BaseNotifier for LoggingNotifier {
    async fn notify_scheduled(&self, event: &Event, recipient: &Recipient) -> Result<()> {
        info!(
            to = %recipient.email,
            role = ?recipient.role,
            subject = %format!("Interview Scheduled - {}", event.round.name),
            event_id = %event.id,
            start_time = %event.start_time,
            duration_minutes = event.duration_minutes,
            conferencing = %event.links.conferencing,
            assessment = %event.links.assessment,
            "sending notification"
        );
        Ok(())
    }

    async fn notify_start(&self, event: &Event, interviewer: &Recipient) -> Result<()> {
        info!(
            to = %interviewer.email,
            subject = %format!("Interview Starting - {}", event.round.name),
            event_id = %event.id,
            message = "Has the interview started?",
            "sending notification"
        );
        Ok(())
    }

    async fn notify_complete(&self, event: &Event, interviewer: &Recipient) -> Result<()> {
        info!(
            to = %interviewer.email,
            subject = %format!("Interview Ending - {}", event.round.name),
            event_id = %event.id,
            scorecard = %event.links.scorecard,
            message = "Please provide interview feedback",
            "sending notification"
        );
        Ok(())
    }
}
