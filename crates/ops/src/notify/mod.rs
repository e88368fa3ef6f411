//! Notification dispatch.
//!
//! One seam, [`Notifier`], with an SMTP implementation for production and
//! an in-memory recording implementation for tests. The dispatcher never
//! retries; callers own per-recipient failure counting, and a failed
//! recipient must never abort a loop over the rest.

pub mod messages;
pub mod smtp;

use std::collections::HashSet;
use std::sync::Mutex;

use thiserror::Error;
use tidewater_core::Email;

pub use messages::RenderedEmail;
pub use smtp::SmtpNotifier;

/// Errors that can occur when dispatching a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Failed to build the message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Recipient or sender address was rejected.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Sends one rendered message to one recipient.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` to `to`. A failure applies to this recipient
    /// only.
    async fn send(&self, to: &Email, message: &RenderedEmail) -> Result<(), NotifyError>;
}

/// Record of one delivered message.
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Recipient address.
    pub to: String,
    /// Message subject.
    pub subject: String,
}

/// In-memory notifier used by tests: records deliveries and can be told
/// to fail for specific recipients.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make future sends to `address` fail.
    pub fn fail_for(&self, address: &str) {
        self.failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(address.to_lowercase());
    }

    /// Messages delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &Email, message: &RenderedEmail) -> Result<(), NotifyError> {
        let rejected = self
            .failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(to.as_str());
        if rejected {
            return Err(NotifyError::InvalidAddress(to.to_string()));
        }

        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(SentMessage {
                to: to.to_string(),
                subject: message.subject.clone(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> RenderedEmail {
        RenderedEmail {
            subject: "subject".to_string(),
            text: "text".to_string(),
            html: "<p>html</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_recording_notifier_records() {
        let notifier = RecordingNotifier::new();
        let to = Email::parse("ops@example.com").expect("valid email");

        notifier.send(&to, &message()).await.expect("send ok");

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ops@example.com");
        assert_eq!(sent[0].subject, "subject");
    }

    #[tokio::test]
    async fn test_recording_notifier_fails_on_request() {
        let notifier = RecordingNotifier::new();
        notifier.fail_for("bad@example.com");

        let bad = Email::parse("bad@example.com").expect("valid email");
        let good = Email::parse("good@example.com").expect("valid email");

        assert!(notifier.send(&bad, &message()).await.is_err());
        assert!(notifier.send(&good, &message()).await.is_ok());
        assert_eq!(notifier.sent().len(), 1);
    }
}
