//! Logging notifier for development setups without SMTP.

use std::sync::{Arc, Mutex};

use campuschat_core::notify::Notifier;
use campuschat_types::error::NotifyError;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub id: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Logs every message at `info` and records it in a shared outbox.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    outbox: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub fn outbox(&self) -> Vec<OutboundMessage> {
        self.outbox
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// The most recent message sent to `to`.
    pub fn last_to(&self, to: &str) -> Option<OutboundMessage> {
        self.outbox().into_iter().rev().find(|m| m.to == to)
    }
}

impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, NotifyError> {
        if !to.contains('@') {
            return Err(NotifyError::InvalidAddress(to.to_string()));
        }

        let message = OutboundMessage {
            id: Uuid::now_v7().to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        tracing::info!(to = %to, subject = %subject, body = %body, "outbound message");

        let id = message.id.clone();
        self.outbox
            .lock()
            .map_err(|_| NotifyError::Transport("outbox lock poisoned".to_string()))?
            .push(message);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outbox_records_messages() {
        let notifier = LogNotifier::new();
        let handle = notifier.clone();

        notifier.send("a@inst.edu", "Code", "first").await.unwrap();
        notifier.send("b@inst.edu", "Code", "other").await.unwrap();
        notifier.send("a@inst.edu", "Code", "second").await.unwrap();

        assert_eq!(handle.outbox().len(), 3);
        assert_eq!(handle.last_to("a@inst.edu").unwrap().body, "second");
        assert!(handle.last_to("c@inst.edu").is_none());
    }

    #[tokio::test]
    async fn test_rejects_address_without_at() {
        let notifier = LogNotifier::new();
        let err = notifier.send("nobody", "Code", "x").await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress(_)));
        assert!(notifier.outbox().is_empty());
    }
}
