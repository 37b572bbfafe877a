//! Activation mail delivery.
//!
//! Sign-up pushes rendered messages onto a bounded in-process queue and
//! returns immediately. A background worker drains the queue and hands each
//! message to a [`MailTransport`]. Nothing is persisted: messages still queued
//! when the process stops are lost, and delivery failures are only logged.

pub mod dispatcher;
pub mod messages;
pub mod transport;

pub use dispatcher::spawn_mail_worker;
pub use dispatcher::QueuedMailDispatcher;
pub use messages::ActivationEmail;
pub use transport::LogMailTransport;
pub use transport::MailTransport;
pub use transport::SmtpMailTransport;
