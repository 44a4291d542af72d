//! In-memory fakes for the calendar and email collaborators

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use bk_calendar::{CalendarError, CalendarEvent, CalendarProvider};
use bk_core::BookingConfig;
use bk_email::{EmailError, EmailMessage, Mailer};

use crate::policy::BookingPolicy;

/// Default policy: Mon-Fri 09:00-17:00 UTC, 60-minute slots, 2-month
/// horizon, 24-hour lead time
pub(crate) fn test_policy() -> BookingPolicy {
    BookingPolicy::from_config(&BookingConfig::default()).unwrap()
}

/// Calendar fake with an atomic uid-conditional create, mirroring the
/// CalDAV `If-None-Match: *` contract
pub(crate) struct FakeCalendar {
    events: Mutex<Vec<CalendarEvent>>,
    list_calls: AtomicUsize,
    /// When set, list_events returns an empty stale snapshot so tests can
    /// drive both racers past the re-confirmation check
    stale_reads: bool,
    fail_reads: bool,
}

impl FakeCalendar {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            stale_reads: false,
            fail_reads: false,
        }
    }

    pub fn with_stale_reads() -> Self {
        Self {
            stale_reads: true,
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::new()
        }
    }

    pub async fn seed(&self, start: DateTime<Utc>, end: DateTime<Utc>) {
        let mut events = self.events.lock().await;
        let mut event = CalendarEvent::new("Seeded busy", start, end);
        event.uid = Some(format!("seed-{}", events.len()));
        events.push(event);
    }

    pub async fn event_count(&self) -> usize {
        self.events.lock().await.len()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarProvider for FakeCalendar {
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> bk_calendar::Result<Vec<CalendarEvent>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_reads {
            return Err(CalendarError::Connection("fake outage".to_string()));
        }
        if self.stale_reads {
            return Ok(Vec::new());
        }

        let events = self.events.lock().await;
        Ok(events
            .iter()
            .filter(|e| e.overlaps(start, end))
            .cloned()
            .collect())
    }

    async fn create_event(&self, event: CalendarEvent) -> bk_calendar::Result<CalendarEvent> {
        let mut events = self.events.lock().await;

        let uid = event
            .uid
            .clone()
            .unwrap_or_else(|| format!("fake-{}", events.len()));
        if events.iter().any(|e| e.uid.as_deref() == Some(&uid)) {
            return Err(CalendarError::Conflict(uid));
        }

        let mut created = event;
        created.uid = Some(uid);
        events.push(created.clone());
        Ok(created)
    }
}

/// Mailer fake that records sent messages, optionally failing every send
pub(crate) struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> bk_email::Result<String> {
        if self.fail {
            return Err(EmailError::SmtpSend("fake relay down".to_string()));
        }
        let mut sent = self.sent.lock().await;
        sent.push(message.clone());
        Ok(format!("queued-{}", sent.len()))
    }
}
