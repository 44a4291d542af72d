//! bk-core: Booking Gateway Core Library
//!
//! Shared configuration and error types for the booking gateway.

pub mod config;
pub mod error;

pub use config::{ApiConfig, BookingConfig, CalendarConfig, Config, SmtpConfig};
pub use error::{Error, Result};
