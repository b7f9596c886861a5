//! Outbound notification implementations.
//!
//! - `smtp`: delivers mail through an SMTP relay via `lettre`
//! - `log`: writes messages to the tracing log and keeps an in-memory outbox
//!
//! [`ConfiguredNotifier`] picks one at startup based on whether SMTP is
//! configured.

pub mod log;
pub mod smtp;

use campuschat_core::notify::Notifier;
use campuschat_types::config::SmtpConfig;
use campuschat_types::error::NotifyError;

pub use self::log::{LogNotifier, OutboundMessage};
pub use self::smtp::SmtpNotifier;

/// Notifier chosen from configuration.
pub enum ConfiguredNotifier {
    Smtp(SmtpNotifier),
    Log(LogNotifier),
}

impl ConfiguredNotifier {
    /// SMTP when `smtp` is present, otherwise the logging notifier.
    pub fn from_config(smtp: Option<&SmtpConfig>) -> Result<Self, NotifyError> {
        match smtp {
            Some(config) => Ok(Self::Smtp(SmtpNotifier::new(config)?)),
            None => {
                tracing::warn!("no SMTP configured; verification codes will be written to the log");
                Ok(Self::Log(LogNotifier::new()))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Log(_) => "log",
        }
    }
}

impl Notifier for ConfiguredNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, NotifyError> {
        match self {
            Self::Smtp(n) => n.send(to, subject, body).await,
            Self::Log(n) => n.send(to, subject, body).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_falls_back_to_log_without_smtp() {
        let notifier = ConfiguredNotifier::from_config(None).unwrap();
        assert_eq!(notifier.kind(), "log");
        let id = notifier.send("a@inst.edu", "Subject", "Body").await.unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn test_smtp_selected_when_configured() {
        let config = SmtpConfig {
            host: "smtp.inst.edu".to_string(),
            username: "mailer".to_string(),
            password: "pw".to_string(),
            from_email: "noreply@inst.edu".to_string(),
            ..SmtpConfig::default()
        };
        let notifier = ConfiguredNotifier::from_config(Some(&config)).unwrap();
        assert_eq!(notifier.kind(), "smtp");
    }
}
