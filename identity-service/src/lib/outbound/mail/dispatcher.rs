use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::UserId;
use crate::domain::identity::models::VerificationToken;
use crate::domain::identity::ports::MailDispatcher;
use crate::outbound::mail::messages::ActivationEmail;
use crate::outbound::mail::transport::MailTransport;

/// Mail dispatcher backed by a bounded tokio channel.
///
/// `send_activation_link` never waits: when the queue is full or the worker
/// is gone, the message is dropped and a warning is logged.
#[derive(Debug, Clone)]
pub struct QueuedMailDispatcher {
    sender: mpsc::Sender<ActivationEmail>,
    app_url: String,
}

impl QueuedMailDispatcher {
    /// Create the dispatcher and the receiving end of its queue.
    ///
    /// # Arguments
    /// * `app_url` - Public base URL used in activation links
    /// * `capacity` - Maximum number of queued messages (at least 1)
    ///
    /// # Returns
    /// The dispatcher and the receiver to pass to [`spawn_mail_worker`]
    pub fn new(app_url: String, capacity: usize) -> (Self, mpsc::Receiver<ActivationEmail>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender, app_url }, receiver)
    }
}

impl MailDispatcher for QueuedMailDispatcher {
    fn send_activation_link(
        &self,
        user_id: &UserId,
        recipient: &EmailAddress,
        token: &VerificationToken,
    ) {
        let message = ActivationEmail::render(&self.app_url, user_id, recipient, token);

        match self.sender.try_send(message) {
            Ok(()) => tracing::debug!(user_id = %user_id, "Activation mail queued"),
            Err(TrySendError::Full(_)) => {
                tracing::warn!(user_id = %user_id, "Mail queue full, activation mail dropped")
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(user_id = %user_id, "Mail worker stopped, activation mail dropped")
            }
        }
    }
}

/// Spawn the background task that delivers queued messages.
///
/// The task ends once every `QueuedMailDispatcher` clone has been dropped
/// and the queue is drained.
pub fn spawn_mail_worker(
    mut receiver: mpsc::Receiver<ActivationEmail>,
    transport: Arc<dyn MailTransport>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            if let Err(e) = transport.deliver(&message).await {
                tracing::error!(
                    recipient = %message.recipient,
                    error = %e,
                    "Failed to deliver activation mail"
                );
            }
        }
        tracing::info!("Mail worker stopped");
    })
}
