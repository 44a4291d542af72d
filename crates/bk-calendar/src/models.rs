//! Data models for calendar integration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calendar event
///
/// Events are owned by the external CalDAV server; this type is the local
/// view of a busy interval plus the metadata a booking carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Event unique identifier
    #[serde(default)]
    pub uid: Option<String>,
    /// Event summary/title
    pub summary: String,
    /// Event description
    #[serde(default)]
    pub description: Option<String>,
    /// Event start time
    pub start: DateTime<Utc>,
    /// Event end time
    pub end: DateTime<Utc>,
    /// Event attendees (email addresses)
    #[serde(default)]
    pub attendees: Vec<String>,
}

impl CalendarEvent {
    /// Create a new calendar event
    pub fn new(summary: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            uid: None,
            summary: summary.into(),
            description: None,
            start,
            end,
            attendees: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an attendee
    pub fn with_attendee(mut self, email: impl Into<String>) -> Self {
        self.attendees.push(email.into());
        self
    }

    /// Whether this event's interval intersects the given interval.
    ///
    /// Touching endpoints do not count as an overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}
