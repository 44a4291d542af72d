//! Booking email composition
//!
//! Plain-text bodies only; the visual template rendering lives with the
//! website, not here.

use crate::send::EmailMessage;

/// Data rendered into booking emails
#[derive(Debug, Clone)]
pub struct BookingEmailData {
    pub name: String,
    pub email: String,
    pub date: String,
    pub start_time: String,
    pub timezone: String,
    pub notes: Option<String>,
}

/// Confirmation email sent to the client who booked
pub fn confirmation(to: &str, data: &BookingEmailData) -> EmailMessage {
    let body = format!(
        "Hi {},\n\n\
         Your call with the studio is confirmed:\n\n\
         Date:  {}\n\
         Time:  {} ({})\n\n\
         We look forward to talking with you. If you need to reschedule,\n\
         just reply to this email.\n\n\
         — The Studio",
        data.name, data.date, data.start_time, data.timezone
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("Booking confirmed — {} {}", data.date, data.start_time),
        body,
    }
}

/// Internal notification sent to the team inbox
pub fn team_notification(to: &str, data: &BookingEmailData) -> EmailMessage {
    let notes = data.notes.as_deref().unwrap_or("(none)");
    let body = format!(
        "New booking:\n\n\
         Name:     {}\n\
         Email:    {}\n\
         Date:     {}\n\
         Time:     {} ({})\n\
         Notes:    {}\n",
        data.name, data.email, data.date, data.start_time, data.timezone, notes
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("New booking: {} on {}", data.name, data.date),
        body,
    }
}
