//! Error responses for the booking API

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

use bk_booking::BookingError;

/// Generic API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a booking error to its HTTP response.
///
/// `SlotUnavailable` gets its own status so clients know to re-fetch
/// availability instead of retrying blindly.
pub fn booking_error_response(error: &BookingError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match error {
        BookingError::Validation(_) => StatusCode::BAD_REQUEST,
        BookingError::SlotUnavailable => StatusCode::CONFLICT,
        BookingError::CalendarRead(_) | BookingError::CalendarWrite(_) => StatusCode::BAD_GATEWAY,
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}
