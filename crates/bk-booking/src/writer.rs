//! Booking creation
//!
//! `create_booking` walks Validated → SlotReconfirmed → EventCreated →
//! NotificationsSent → Complete. The external calendar is the source of
//! truth: the slot is re-checked immediately before the write, and the
//! event uid is derived from the slot so the server's conditional-write
//! semantics arbitrate concurrent bookers racing on the same slot.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bk_calendar::{CalendarError, CalendarEvent, CalendarProvider};
use bk_email::{BookingEmailData, Mailer, confirmation, team_notification};

use crate::error::{BookingError, Result};
use crate::policy::BookingPolicy;
use crate::slots::{TimeSlot, local_to_utc, slot_at};

/// A booking submitted by a client. Schema validation (shape, formats)
/// happens at the API boundary; the writer re-validates the semantics.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Client timezone, carried into emails only
    pub timezone: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The committed result of a successful booking
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub booking_id: String,
    /// True when both confirmation and team notification were delivered
    pub notifications_sent: bool,
}

/// Validates, re-confirms, and commits booking requests.
pub struct BookingWriter {
    policy: Arc<BookingPolicy>,
    calendar: Arc<dyn CalendarProvider>,
    mailer: Arc<dyn Mailer>,
    notify_address: String,
}

impl BookingWriter {
    pub fn new(
        policy: Arc<BookingPolicy>,
        calendar: Arc<dyn CalendarProvider>,
        mailer: Arc<dyn Mailer>,
        notify_address: impl Into<String>,
    ) -> Self {
        Self {
            policy,
            calendar,
            mailer,
            notify_address: notify_address.into(),
        }
    }

    /// Commit a booking.
    ///
    /// Fails with `Validation` when the request does not name a bookable
    /// slot, `SlotUnavailable` when the slot was taken in the meantime, and
    /// `CalendarWrite` when the calendar rejects the event. Email failures
    /// are logged and reported through `notifications_sent`, never as an
    /// error: the calendar event is the booking.
    pub async fn create_booking(&self, request: &BookingRequest) -> Result<Booking> {
        let now = Utc::now();

        // Validated
        let slot = self.validate(request, now)?;
        let (start, end) = self.slot_bounds(&slot)?;

        // SlotReconfirmed: targeted busy-check right before the write
        let busy = self
            .calendar
            .list_events(start, end)
            .await
            .map_err(BookingError::CalendarRead)?;
        if busy.iter().any(|event| event.overlaps(start, end)) {
            info!("Slot {} {} already taken", slot.date, slot.start);
            return Err(BookingError::SlotUnavailable);
        }

        // EventCreated: uid is the slot key, so two writers racing on the
        // same slot collide on the server instead of double-booking
        let event = self.build_event(request, start, end);
        let created = match self.calendar.create_event(event).await {
            Ok(created) => created,
            Err(CalendarError::Conflict(uid)) => {
                info!("Concurrent booking won slot {}", uid);
                return Err(BookingError::SlotUnavailable);
            }
            Err(e) => return Err(BookingError::CalendarWrite(e)),
        };

        let booking_id = created
            .uid
            .clone()
            .unwrap_or_else(|| slot_uid(start));

        // NotificationsSent: best effort, never rolls back the event
        let notifications_sent = self.send_notifications(request).await;

        info!("Booking complete: {}", booking_id);

        // Complete
        Ok(Booking {
            booking_id,
            notifications_sent,
        })
    }

    /// Re-derive the requested slot and confirm it is bookable under the
    /// current policy (horizon, working hours, alignment, lead time).
    fn validate(&self, request: &BookingRequest, now: DateTime<Utc>) -> Result<TimeSlot> {
        if request.name.trim().is_empty() {
            return Err(BookingError::Validation("Name must not be empty".to_string()));
        }
        if !request.email.contains('@') {
            return Err(BookingError::Validation(format!(
                "Invalid email address: {}",
                request.email
            )));
        }

        slot_at(&self.policy, request.date, request.start_time, now).ok_or_else(|| {
            BookingError::Validation(format!(
                "{} {} is not a bookable slot",
                request.date, request.start_time
            ))
        })
    }

    fn slot_bounds(&self, slot: &TimeSlot) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = local_to_utc(&self.policy, slot.date, slot.start);
        let end = local_to_utc(&self.policy, slot.date, slot.end);
        match (start, end) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(BookingError::Validation(format!(
                "{} {} cannot be resolved in {}",
                slot.date, slot.start, self.policy.timezone
            ))),
        }
    }

    fn build_event(
        &self,
        request: &BookingRequest,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CalendarEvent {
        let mut event = CalendarEvent::new(format!("Booking: {}", request.name.trim()), start, end)
            .with_description(format!(
                "Client: {} <{}>\nTimezone: {}\nNotes: {}",
                request.name.trim(),
                request.email,
                request.timezone,
                request.notes.as_deref().unwrap_or("-")
            ))
            .with_attendee(request.email.clone());
        event.uid = Some(slot_uid(start));
        event
    }

    async fn send_notifications(&self, request: &BookingRequest) -> bool {
        let data = BookingEmailData {
            name: request.name.trim().to_string(),
            email: request.email.clone(),
            date: request.date.to_string(),
            start_time: request.start_time.format("%H:%M").to_string(),
            timezone: request.timezone.clone(),
            notes: request.notes.clone(),
        };

        let mut sent = true;

        if let Err(e) = self.mailer.send(&confirmation(&request.email, &data)).await {
            warn!("Confirmation email to {} failed: {}", request.email, e);
            sent = false;
        }

        if self.notify_address.is_empty() {
            warn!("No team notification address configured");
        } else if let Err(e) = self
            .mailer
            .send(&team_notification(&self.notify_address, &data))
            .await
        {
            warn!("Team notification to {} failed: {}", self.notify_address, e);
            sent = false;
        }

        sent
    }
}

/// Deterministic event uid for a slot; doubles as the idempotency key for
/// the conditional calendar write.
fn slot_uid(start: DateTime<Utc>) -> String {
    format!("booking-{}", start.format("%Y%m%dT%H%M%SZ"))
}
