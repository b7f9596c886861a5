//! Outbound notification collaborator.
//!
//! Implementations live in campuschat-infra (`SmtpNotifier`, `LogNotifier`).

use campuschat_types::error::NotifyError;

/// Sends a plain-text message to one recipient.
pub trait Notifier: Send + Sync {
    /// Deliver `body` to `to`. Returns a delivery id on success.
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl std::future::Future<Output = Result<String, NotifyError>> + Send;
}
