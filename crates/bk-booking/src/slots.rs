//! Availability calculation
//!
//! Slot computation is a pure function of (policy, busy events, current
//! time): identical inputs always produce the identical slot sequence.
//! [`AvailabilityCalculator`] wraps it with the single date-bounded
//! calendar query a day lookup needs.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bk_calendar::{CalendarEvent, CalendarProvider};

use crate::error::{BookingError, Result};
use crate::policy::BookingPolicy;

/// A candidate bookable interval; has no identity until booked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub duration_minutes: u32,
}

/// All open slots for one date, recomputed on every query
#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

/// Convert a local policy time on a date to UTC.
///
/// Returns None for times that do not exist in the policy timezone (DST
/// gaps); such slots are simply not offered.
pub(crate) fn local_to_utc(
    policy: &BookingPolicy,
    date: NaiveDate,
    time: NaiveTime,
) -> Option<DateTime<Utc>> {
    policy
        .timezone
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// First instant of a local calendar date, in UTC.
///
/// Midnight itself can fall in a DST gap (Brazil's spring-forward used to
/// jump 00:00 straight to 01:00); slide forward hour by hour to the first
/// wall-clock time the date actually has.
pub(crate) fn day_start_utc(policy: &BookingPolicy, date: NaiveDate) -> Option<DateTime<Utc>> {
    (0..3)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .find_map(|time| local_to_utc(policy, date, time))
}

/// UTC bounds of a local calendar date: [first instant, next day's first)
pub(crate) fn day_bounds_utc(
    policy: &BookingPolicy,
    date: NaiveDate,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = day_start_utc(policy, date)?;
    let end = day_start_utc(policy, date.succ_opt()?)?;
    Some((start, end))
}

/// Whether a date falls inside the booking horizon: not before today and
/// not beyond `horizon_months` from today, in the policy timezone.
pub fn within_horizon(policy: &BookingPolicy, date: NaiveDate, now: DateTime<Utc>) -> bool {
    let today = now.with_timezone(&policy.timezone).date_naive();
    if date < today {
        return false;
    }
    match today.checked_add_months(Months::new(policy.horizon_months)) {
        Some(horizon_end) => date <= horizon_end,
        None => false,
    }
}

/// Partition a date's open intervals into bookable slots.
///
/// A slot is kept only when it fits entirely inside an open interval, does
/// not intersect any busy event (partial overlap is a conflict), and starts
/// no earlier than `now + min_lead`. Output is ascending by start time.
pub fn partition_day(
    policy: &BookingPolicy,
    date: NaiveDate,
    busy: &[CalendarEvent],
    now: DateTime<Utc>,
) -> Vec<TimeSlot> {
    if !within_horizon(policy, date, now) {
        return Vec::new();
    }

    let duration = policy.slot_duration();
    let earliest_start = now + policy.min_lead;
    let mut slots = Vec::new();

    for interval in policy.hours.open_intervals(date.weekday()) {
        let interval_end = date.and_time(interval.end);
        let mut slot_start = date.and_time(interval.start);

        while slot_start + duration <= interval_end {
            let local_start = slot_start.time();
            let slot_end = slot_start + duration;

            let (Some(start_utc), Some(end_utc)) = (
                local_to_utc(policy, date, local_start),
                local_to_utc(policy, slot_end.date(), slot_end.time()),
            ) else {
                slot_start += duration;
                continue;
            };

            let conflicted = busy.iter().any(|event| event.overlaps(start_utc, end_utc));
            if !conflicted && start_utc >= earliest_start {
                slots.push(TimeSlot {
                    date,
                    start: local_start,
                    end: slot_end.time(),
                    duration_minutes: policy.slot_minutes,
                });
            }

            slot_start += duration;
        }
    }

    slots.sort_by_key(|s| s.start);
    slots
}

/// Resolve a requested (date, start time) to the policy slot it names.
///
/// Returns None when the time does not land on a slot boundary inside an
/// open interval, is outside the horizon, or violates the lead time.
pub fn slot_at(
    policy: &BookingPolicy,
    date: NaiveDate,
    start: NaiveTime,
    now: DateTime<Utc>,
) -> Option<TimeSlot> {
    partition_day(policy, date, &[], now)
        .into_iter()
        .find(|slot| slot.start == start)
}

/// Computes open time slots from the working-hours policy minus existing
/// calendar events.
#[derive(Clone)]
pub struct AvailabilityCalculator {
    policy: Arc<BookingPolicy>,
    calendar: Arc<dyn CalendarProvider>,
}

impl AvailabilityCalculator {
    pub fn new(policy: Arc<BookingPolicy>, calendar: Arc<dyn CalendarProvider>) -> Self {
        Self { policy, calendar }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    pub(crate) fn calendar(&self) -> &Arc<dyn CalendarProvider> {
        &self.calendar
    }

    /// Open slots for one date.
    ///
    /// Dates outside the horizon and closed weekdays yield an empty list
    /// without touching the calendar; upstream calendar failures propagate
    /// unchanged.
    pub async fn day_slots(&self, date: NaiveDate) -> Result<DayAvailability> {
        let now = Utc::now();

        let closed = self
            .policy
            .hours
            .open_intervals(date.weekday())
            .is_empty();
        if closed || !within_horizon(&self.policy, date, now) {
            return Ok(DayAvailability {
                date,
                slots: Vec::new(),
            });
        }

        let Some((start, end)) = day_bounds_utc(&self.policy, date) else {
            return Ok(DayAvailability {
                date,
                slots: Vec::new(),
            });
        };

        let busy = self
            .calendar
            .list_events(start, end)
            .await
            .map_err(BookingError::CalendarRead)?;

        debug!("{}: {} busy events", date, busy.len());

        Ok(DayAvailability {
            date,
            slots: partition_day(&self.policy, date, &busy, now),
        })
    }
}
