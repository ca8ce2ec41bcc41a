// TestDependencies - mock implementations for testing
//
// Provides mock collaborators that can be injected into ServerDeps for tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

use super::jobs::InMemoryTaskQueue;
use super::{BaseClock, BaseNotifier, NotificationDispatcher, Recipient, ServerDeps};
use crate::config::RetryPolicy;
use crate::common::EventId;
use crate::domains::drives::models::Event;
use crate::domains::drives::store::InMemoryDriveStore;

// =============================================================================
// Recording Notifier
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Scheduled,
    Start,
    Complete,
}

/// One captured notification
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub kind: NotificationKind,
    pub event_id: EventId,
    pub recipient: Recipient,
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn of_kind(&self, kind: NotificationKind) -> Vec<SentNotification> {
        self.sent()
            .into_iter()
            .filter(|n| n.kind == kind)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn record(&self, kind: NotificationKind, event: &Event, recipient: &Recipient) {
        self.sent.lock().unwrap().push(SentNotification {
            kind,
            event_id: event.id,
            recipient: recipient.clone(),
        });
    }
}

#[async_trait]
impl BaseNotifier for RecordingNotifier {
    async fn notify_scheduled(&self, event: &Event, recipient: &Recipient) -> Result<()> {
        self.record(NotificationKind::Scheduled, event, recipient);
        Ok(())
    }

    async fn notify_start(&self, event: &Event, interviewer: &Recipient) -> Result<()> {
        self.record(NotificationKind::Start, event, interviewer);
        Ok(())
    }

    async fn notify_complete(&self, event: &Event, interviewer: &Recipient) -> Result<()> {
        self.record(NotificationKind::Complete, event, interviewer);
        Ok(())
    }
}

// =============================================================================
// Failing Notifier
// =============================================================================

/// Every delivery fails.
pub struct FailingNotifier;

#[async_trait]
impl BaseNotifier for FailingNotifier {
    async fn notify_scheduled(&self, _event: &Event, recipient: &Recipient) -> Result<()> {
        bail!("mailbox {} unreachable", recipient.email)
    }

    async fn notify_start(&self, _event: &Event, interviewer: &Recipient) -> Result<()> {
        bail!("mailbox {} unreachable", interviewer.email)
    }

    async fn notify_complete(&self, _event: &Event, interviewer: &Recipient) -> Result<()> {
        bail!("mailbox {} unreachable", interviewer.email)
    }
}

// =============================================================================
// Test Clock
// =============================================================================

/// Settable clock.
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl BaseClock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// In-memory ServerDeps plus handles to the mocks behind it.
pub struct TestDependencies {
    pub deps: ServerDeps,
    pub store: Arc<InMemoryDriveStore>,
    pub tasks: Arc<InMemoryTaskQueue>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<TestClock>,
}

impl TestDependencies {
    pub fn new(now: DateTime<Utc>) -> Self {
        let store = Arc::new(InMemoryDriveStore::new());
        let tasks = Arc::new(InMemoryTaskQueue::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(TestClock::new(now));

        let deps = ServerDeps::new(
            store.clone(),
            tasks.clone(),
            NotificationDispatcher::new(notifier.clone()),
            clock.clone(),
            RetryPolicy::immediate(3),
        );

        Self {
            deps,
            store,
            tasks,
            notifier,
            clock,
        }
    }

    /// Waits for fire-and-forget notifications to land in the recorder.
    pub async fn flush_notifications(&self) {
        self.deps.notifications.flush().await;
    }
}
