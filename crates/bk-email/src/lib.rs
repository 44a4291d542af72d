//! bk-email: Booking emails for bk-gateway
//!
//! This crate provides the email collaborator: the [`Mailer`] trait, the
//! SMTP sender, and the booking confirmation/notification messages.

pub mod error;
pub mod messages;
pub mod send;

pub use error::{EmailError, Result};
pub use messages::{BookingEmailData, confirmation, team_notification};
pub use send::{EmailMessage, EmailSender, Mailer};
