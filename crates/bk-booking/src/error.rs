//! Error types for bk-booking

use thiserror::Error;

use bk_calendar::CalendarError;

/// bk-booking error type
///
/// Calendar errors keep their read/write context so the API layer can map
/// them to distinct responses. Notification failures are deliberately
/// absent: they are logged by the writer and never fail a booking.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Requested slot is no longer available")]
    SlotUnavailable,

    #[error("Calendar read failed: {0}")]
    CalendarRead(#[source] CalendarError),

    #[error("Calendar write failed: {0}")]
    CalendarWrite(#[source] CalendarError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BookingError>;
