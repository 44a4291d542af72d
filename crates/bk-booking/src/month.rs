//! Month-level availability aggregation
//!
//! One range query covers the whole month; the per-day partitioning then
//! runs locally. This keeps the external calendar at one call per month
//! instead of one per day.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use bk_calendar::CalendarEvent;

use crate::error::{BookingError, Result};
use crate::slots::{AvailabilityCalculator, day_bounds_utc, partition_day};

/// Summary for one date; the full slot list is deliberately not carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub has_slots: bool,
    pub slot_count: usize,
}

/// Date-ordered summary covering every day of the month
pub type MonthAvailability = BTreeMap<NaiveDate, DaySummary>;

impl AvailabilityCalculator {
    /// Availability summary for every day of a month.
    ///
    /// Days outside the horizon or without working hours appear with
    /// `has_slots: false`. Calendar read failures propagate unchanged.
    pub async fn month_availability(&self, year: i32, month: u32) -> Result<MonthAvailability> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| BookingError::Validation(format!("Invalid month: {}-{}", year, month)))?;
        let next_month = match month {
            12 => NaiveDate::from_ymd_opt(year + 1, 1, 1),
            _ => NaiveDate::from_ymd_opt(year, month + 1, 1),
        }
        .expect("first day of a month is always valid");

        let now = Utc::now();
        let busy = self.fetch_month_events(first, next_month, now).await?;

        debug!("{}-{:02}: {} busy events", year, month, busy.len());

        let mut summary = MonthAvailability::new();
        let mut date = first;
        while date < next_month {
            let day_busy = events_for_day(self.policy(), date, &busy);
            let slots = partition_day(self.policy(), date, &day_busy, now);
            summary.insert(
                date,
                DaySummary {
                    has_slots: !slots.is_empty(),
                    slot_count: slots.len(),
                },
            );
            date = date.succ_opt().expect("date range stays in bounds");
        }

        Ok(summary)
    }

    /// Single range query for the month, clamped to the days that can have
    /// slots at all. A month entirely outside the horizon needs no query.
    async fn fetch_month_events(
        &self,
        first: NaiveDate,
        next_month: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let last = next_month.pred_opt().expect("month has a last day");
        let today = now.with_timezone(&self.policy().timezone).date_naive();
        let horizon_end = today.checked_add_months(chrono::Months::new(self.policy().horizon_months));

        let intersects_horizon = match horizon_end {
            Some(end) => first <= end && last >= today,
            None => false,
        };
        if !intersects_horizon {
            return Ok(Vec::new());
        }

        let Some((range_start, _)) = day_bounds_utc(self.policy(), first) else {
            return Ok(Vec::new());
        };
        let Some((range_end, _)) = day_bounds_utc(self.policy(), next_month) else {
            return Ok(Vec::new());
        };

        self.calendar()
            .list_events(range_start, range_end)
            .await
            .map_err(BookingError::CalendarRead)
    }
}

/// Busy events intersecting one local calendar date
fn events_for_day(
    policy: &crate::policy::BookingPolicy,
    date: NaiveDate,
    busy: &[CalendarEvent],
) -> Vec<CalendarEvent> {
    let Some((start, end)) = day_bounds_utc(policy, date) else {
        return Vec::new();
    };
    busy.iter()
        .filter(|event| event.overlaps(start, end))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeCalendar, test_policy};
    use chrono::Datelike;
    use std::sync::Arc;

    fn calculator(calendar: Arc<FakeCalendar>) -> AvailabilityCalculator {
        AvailabilityCalculator::new(Arc::new(test_policy()), calendar)
    }

    #[tokio::test]
    async fn test_month_has_every_day() {
        let calendar = Arc::new(FakeCalendar::new());
        let calc = calculator(calendar.clone());

        let summary = calc.month_availability(2025, 2).await.unwrap();

        assert_eq!(summary.len(), 28);
        // Weekend days are present but closed
        let sunday = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        assert_eq!(
            summary[&sunday],
            DaySummary {
                has_slots: false,
                slot_count: 0
            }
        );
    }

    #[tokio::test]
    async fn test_month_uses_single_calendar_call() {
        let calendar = Arc::new(FakeCalendar::new());
        let calc = calculator(calendar.clone());

        calc.month_availability(2025, 6).await.unwrap();

        assert_eq!(calendar.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_month_far_in_past_skips_calendar() {
        let calendar = Arc::new(FakeCalendar::new());
        let calc = calculator(calendar.clone());

        let summary = calc.month_availability(2020, 1).await.unwrap();

        assert_eq!(calendar.list_calls(), 0);
        assert!(summary.values().all(|s| !s.has_slots));
    }

    #[tokio::test]
    async fn test_month_summary_matches_day_slots() {
        let calendar = Arc::new(FakeCalendar::new());
        // Block a full working day somewhere in the current horizon
        let target = first_open_day(&test_policy());
        calendar
            .seed(
                target.and_hms_opt(0, 0, 0).unwrap().and_utc(),
                target.and_hms_opt(23, 59, 0).unwrap().and_utc(),
            )
            .await;

        let calc = calculator(calendar.clone());
        let summary = calc
            .month_availability(target.year(), target.month())
            .await
            .unwrap();

        for (date, day) in &summary {
            let slots = calc.day_slots(*date).await.unwrap().slots;
            assert_eq!(day.slot_count, slots.len(), "mismatch on {}", date);
            assert_eq!(day.has_slots, !slots.is_empty());
        }
        assert!(!summary[&target].has_slots);
    }

    #[tokio::test]
    async fn test_calendar_error_propagates() {
        let calendar = Arc::new(FakeCalendar::failing());
        let calc = calculator(calendar);

        let target = first_open_day(&test_policy());
        let result = calc.month_availability(target.year(), target.month()).await;

        assert!(matches!(result, Err(BookingError::CalendarRead(_))));
    }

    /// First weekday with open hours that also clears the lead time
    fn first_open_day(policy: &crate::policy::BookingPolicy) -> NaiveDate {
        let mut date = Utc::now()
            .date_naive()
            .checked_add_days(chrono::Days::new(3))
            .unwrap();
        while policy.hours.open_intervals(date.weekday()).is_empty() {
            date = date.succ_opt().unwrap();
        }
        date
    }
}
