//! Calendar provider trait
//!
//! The booking core talks to the calendar through this trait so tests can
//! substitute an in-memory implementation for the CalDAV client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::CalendarEvent;

/// External calendar collaborator.
///
/// The external calendar is the single source of truth for busy intervals
/// and the arbiter of concurrent event creation.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// List events intersecting the given time range.
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Create a new event. Fails with `CalendarError::Conflict` if an event
    /// with the same uid already exists on the server.
    async fn create_event(&self, event: CalendarEvent) -> Result<CalendarEvent>;
}
