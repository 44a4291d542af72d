//! bk-calendar: CalDAV calendar integration for bk-gateway
//!
//! The booking core treats the external calendar as the source of truth for
//! busy intervals. This crate provides:
//!
//! - The [`CalendarProvider`] trait consumed by the booking core
//! - A CalDAV client implementation (range query + conditional event write)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bk_calendar::{CalDavClient, CalendarProvider};
//! use bk_core::CalendarConfig;
//!
//! let client = CalDavClient::new(CalendarConfig {
//!     server_url: "https://caldav.example.com".to_string(),
//!     username: "studio".to_string(),
//!     password: "secret".to_string(),
//!     calendar_id: Some("bookings".to_string()),
//! })?;
//!
//! let events = client.list_events(
//!     chrono::Utc::now(),
//!     chrono::Utc::now() + chrono::Duration::days(30),
//! ).await?;
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod provider;

pub use client::CalDavClient;
pub use error::{CalendarError, Result};
pub use models::CalendarEvent;
pub use provider::CalendarProvider;
