use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::config::SmtpConfig;
use crate::identity::errors::MailError;
use crate::outbound::mail::messages::ActivationEmail;

/// Delivery backend used by the mail worker.
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    /// # Errors
    /// * `MailError` - Message could not be built or handed off
    async fn deliver(&self, message: &ActivationEmail) -> Result<(), MailError>;
}

/// Transport that writes messages to the log instead of sending them.
///
/// The verification token is masked in the logged link.
#[derive(Debug, Clone, Default)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn deliver(&self, message: &ActivationEmail) -> Result<(), MailError> {
        tracing::info!(
            recipient = %message.recipient,
            subject = %message.subject,
            link = %message.redacted_link(),
            "Activation mail delivered to log"
        );
        Ok(())
    }
}

/// Transport relaying plain-text messages through an SMTP server.
pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailTransport {
    /// Build the relay from configuration. No connection is opened until the
    /// first delivery.
    ///
    /// # Errors
    /// * `InvalidAddress` - Sender is not a valid mailbox
    /// * `Configuration` - Relay host could not be set up for TLS
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let sender = config
            .sender
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", config.sender, e)))?;

        let builder = if config.implicit_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| MailError::Configuration(e.to_string()))?
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            mailer: builder.build(),
            sender,
        })
    }

    fn build_message(&self, message: &ActivationEmail) -> Result<Message, MailError> {
        let recipient = message
            .recipient
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", message.recipient, e)))?;

        Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| MailError::DeliveryFailed(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, message: &ActivationEmail) -> Result<(), MailError> {
        let email = self.build_message(message)?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| MailError::DeliveryFailed(e.to_string()))?;

        tracing::debug!(recipient = %message.recipient, "Activation mail sent");
        Ok(())
    }
}
