//! Error types for bk-calendar

use thiserror::Error;

/// bk-calendar error type
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("CalDAV error: {0}")]
    Caldav(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("Create error: {0}")]
    Create(String),

    #[error("Event already exists: {0}")]
    Conflict(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CalendarError>;
