//! HTTP API handlers
//!
//! Request handlers for the booking endpoints.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use bk_booking::{Booking, BookingRequest, MonthAvailability, TimeSlot};

use crate::error::{ErrorResponse, booking_error_response};
use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Query string for month availability
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// Month in YYYY-MM format
    pub month: String,
}

/// Month availability response payload
#[derive(Debug, Serialize)]
pub struct MonthResponse {
    pub month: String,
    pub days: MonthAvailability,
}

/// Query string for day slots
#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    /// Date in YYYY-MM-DD format
    pub date: NaiveDate,
}

/// Day slots response payload
#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Month availability summary
pub async fn month_availability(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthResponse>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Availability request: {}", query.month);

    let (year, month) = parse_month(&query.month).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Malformed month: {}", query.month),
            }),
        )
    })?;

    match state.calculator.month_availability(year, month).await {
        Ok(days) => Ok(Json(MonthResponse {
            month: query.month,
            days,
        })),
        Err(e) => {
            error!("Month availability failed: {}", e);
            Err(booking_error_response(&e))
        }
    }
}

/// Open slots for a single date
pub async fn day_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Slots request: {}", query.date);

    match state.calculator.day_slots(query.date).await {
        Ok(availability) => Ok(Json(SlotsResponse {
            date: availability.date,
            slots: availability.slots,
        })),
        Err(e) => {
            error!("Day slots failed: {}", e);
            Err(booking_error_response(&e))
        }
    }
}

/// Create a booking for a specific slot.
///
/// Body deserialization failures are reported as 400, same as the
/// validation errors raised further down.
pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<Booking>, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid request body: {}", rejection.body_text()),
            }),
        )
    })?;

    debug!("Booking request: {} on {}", request.email, request.date);

    match state.writer.create_booking(&request).await {
        Ok(booking) => Ok(Json(booking)),
        Err(e) => {
            error!("Booking failed: {}", e);
            Err(booking_error_response(&e))
        }
    }
}

/// Parse a "YYYY-MM" month string
fn parse_month(value: &str) -> Option<(i32, u32)> {
    let (year_str, month_str) = value.split_once('-')?;
    if year_str.len() != 4 || month_str.len() != 2 {
        return None;
    }
    let year: i32 = year_str.parse().ok()?;
    let month: u32 = month_str.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Datelike, Days, Utc};

    use bk_booking::{AvailabilityCalculator, BookingPolicy, BookingWriter};
    use bk_calendar::{CalendarError, CalendarEvent, CalendarProvider};
    use bk_core::BookingConfig;
    use bk_email::{EmailMessage, Mailer};

    struct EmptyCalendar {
        fail: bool,
    }

    #[async_trait]
    impl CalendarProvider for EmptyCalendar {
        async fn list_events(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> bk_calendar::Result<Vec<CalendarEvent>> {
            if self.fail {
                return Err(CalendarError::Connection("down".to_string()));
            }
            Ok(Vec::new())
        }

        async fn create_event(&self, event: CalendarEvent) -> bk_calendar::Result<CalendarEvent> {
            Ok(event)
        }
    }

    struct NullMailer;

    #[async_trait]
    impl Mailer for NullMailer {
        async fn send(&self, _message: &EmailMessage) -> bk_email::Result<String> {
            Ok("queued".to_string())
        }
    }

    fn state(fail_calendar: bool) -> AppState {
        let policy = Arc::new(BookingPolicy::from_config(&BookingConfig::default()).unwrap());
        let calendar: Arc<dyn CalendarProvider> = Arc::new(EmptyCalendar {
            fail: fail_calendar,
        });
        let mailer: Arc<dyn Mailer> = Arc::new(NullMailer);

        AppState {
            calculator: AvailabilityCalculator::new(Arc::clone(&policy), Arc::clone(&calendar)),
            writer: Arc::new(BookingWriter::new(
                policy,
                calendar,
                mailer,
                "team@studio.example",
            )),
        }
    }

    /// A bookable weekday comfortably past the lead time
    fn open_date() -> NaiveDate {
        let policy = BookingPolicy::from_config(&BookingConfig::default()).unwrap();
        let mut date = Utc::now().date_naive().checked_add_days(Days::new(3)).unwrap();
        while policy.hours.open_intervals(date.weekday()).is_empty() {
            date = date.succ_opt().unwrap();
        }
        date
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-02"), Some((2025, 2)));
        assert_eq!(parse_month("2025-12"), Some((2025, 12)));
    }

    #[test]
    fn test_parse_month_rejects_malformed() {
        assert_eq!(parse_month("2025"), None);
        assert_eq!(parse_month("2025-13"), None);
        assert_eq!(parse_month("2025-00"), None);
        assert_eq!(parse_month("25-02"), None);
        assert_eq!(parse_month("2025-2"), None);
        assert_eq!(parse_month("2025-06-01"), None);
    }

    #[tokio::test]
    async fn test_month_availability_rejects_malformed_month() {
        let result = month_availability(
            State(state(false)),
            Query(MonthQuery {
                month: "junk".to_string(),
            }),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_month_availability_upstream_failure_is_502() {
        let date = open_date();
        let result = month_availability(
            State(state(true)),
            Query(MonthQuery {
                month: format!("{}-{:02}", date.year(), date.month()),
            }),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_day_slots_returns_open_day() {
        let date = open_date();
        let result = day_slots(State(state(false)), Query(SlotsQuery { date }))
            .await
            .unwrap();

        assert_eq!(result.0.date, date);
        assert_eq!(result.0.slots.len(), 8);
    }

    #[tokio::test]
    async fn test_create_booking_malformed_body_is_400() {
        use axum::body::Body;
        use axum::http::{Request, header};
        use tower::ServiceExt;

        let app = crate::routes::routes().with_state(state(false));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/booking/create")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_booking_round_trip() {
        let request = BookingRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            date: open_date(),
            start_time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            timezone: "Europe/London".to_string(),
            notes: None,
        };

        let booking = create_booking(State(state(false)), Ok(Json(request)))
            .await
            .unwrap();

        assert!(booking.0.booking_id.starts_with("booking-"));
        assert!(booking.0.notifications_sent);
    }
}
