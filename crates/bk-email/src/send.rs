//! Email sending via SMTP
//!
//! The default build queues messages through a logging stub; enable the
//! `smtp` feature for real delivery via lettre.

use async_trait::async_trait;
use tracing::info;

use bk_core::SmtpConfig;

use crate::error::{EmailError, Result};

/// An outgoing email
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Email collaborator consumed by the booking core.
///
/// Delivery failures surface as errors; the caller decides whether they are
/// fatal (for bookings they are not).
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a message, returning a delivery/queue identifier.
    async fn send(&self, message: &EmailMessage) -> Result<String>;
}

/// SMTP email sender
#[derive(Debug, Clone)]
pub struct EmailSender {
    config: SmtpConfig,
}

impl EmailSender {
    /// Create a new email sender
    pub fn new(config: SmtpConfig) -> Result<Self> {
        if config.from_address.is_empty() {
            return Err(EmailError::SmtpConfig(
                "from_address is not set".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Internal notification address from the configuration
    pub fn notify_address(&self) -> &str {
        &self.config.notify_address
    }

    #[cfg(feature = "smtp")]
    async fn deliver(&self, message: &EmailMessage) -> Result<String> {
        use lettre::message::Mailbox;
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

        let from: Mailbox = self
            .config
            .from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.config.from_address.clone()))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| EmailError::InvalidAddress(message.to.clone()))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(&message.subject)
            .body(message.body.clone())
            .map_err(|e| EmailError::SmtpSend(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|e| EmailError::SmtpConfig(e.to_string()))?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.user.clone(),
                self.config.pass.clone(),
            ))
            .build();

        let response = transport
            .send(email)
            .await
            .map_err(|e| EmailError::SmtpSend(e.to_string()))?;

        Ok(response.code().to_string())
    }

    #[cfg(not(feature = "smtp"))]
    async fn deliver(&self, message: &EmailMessage) -> Result<String> {
        // Stub transport: logs and reports the message as queued
        Ok(format!(
            "Email queued: to={}, subject={}, length={} (SMTP: {}:{})",
            message.to,
            message.subject,
            message.body.len(),
            self.config.host,
            self.config.port
        ))
    }
}

#[async_trait]
impl Mailer for EmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<String> {
        info!(
            "Sending email to {} via {}:{}",
            message.to, self.config.host, self.config.port
        );
        self.deliver(message).await
    }
}
