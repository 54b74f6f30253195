//! Outbound notification seam. Mail transport lives outside this service;
//! confirmations hand a payload to whatever `Notifier` the state carries and
//! never let a delivery failure back into registration state.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_SENDER: &str = "no-reply@td-uit.no";

#[derive(Debug, Clone)]
pub struct MailPayload {
    pub to: Vec<String>,
    pub subject: String,
    pub content: String,
    pub sent_by: String,
}

impl MailPayload {
    pub fn new(to: Vec<String>, subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            content: content.into(),
            sent_by: DEFAULT_SENDER.to_string(),
        }
    }
}

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, mail: MailPayload) -> Result<(), NotifyError>;
}

/// Stand-in transport: records the hand-off in the log and succeeds.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, mail: MailPayload) -> Result<(), NotifyError> {
        info!(
            recipients = mail.to.len(),
            subject = %mail.subject,
            "handing mail to transport"
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Mutex;

    use super::*;

    /// Captures every payload handed to it.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<MailPayload>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, mail: MailPayload) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }

    /// Records after an artificial transport delay, standing in for a slow
    /// or hung mail relay.
    #[derive(Debug, Default)]
    pub struct SlowNotifier {
        pub sent: Mutex<Vec<MailPayload>>,
    }

    #[async_trait]
    impl Notifier for SlowNotifier {
        async fn send(&self, mail: MailPayload) -> Result<(), NotifyError> {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }

    /// Rejects every payload; used to prove delivery failures stay
    /// out of registration state.
    #[derive(Debug, Default)]
    pub struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _mail: MailPayload) -> Result<(), NotifyError> {
            Err(NotifyError("transport unavailable".into()))
        }
    }
}
