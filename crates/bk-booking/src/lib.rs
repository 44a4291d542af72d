//! bk-booking: Booking core for bk-gateway
//!
//! Reconciles the external calendar's busy state with the configured
//! working-hours policy to produce bookable slots, and commits bookings
//! against the calendar with re-confirmation before every write.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bk_booking::{AvailabilityCalculator, BookingPolicy, BookingWriter};
//!
//! let policy = Arc::new(BookingPolicy::from_config(&config.booking)?);
//! let calculator = AvailabilityCalculator::new(policy.clone(), calendar.clone());
//!
//! let day = calculator.day_slots(date).await?;
//! let month = calculator.month_availability(2025, 6).await?;
//!
//! let writer = BookingWriter::new(policy, calendar, mailer, notify_address);
//! let booking = writer.create_booking(&request).await?;
//! ```

pub mod error;
pub mod month;
pub mod policy;
pub mod slots;
pub mod writer;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{BookingError, Result};
pub use month::{DaySummary, MonthAvailability};
pub use policy::{BookingPolicy, OpenInterval, WorkingHoursPolicy};
pub use slots::{AvailabilityCalculator, DayAvailability, TimeSlot};
pub use writer::{Booking, BookingRequest, BookingWriter};
