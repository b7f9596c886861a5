//! SMTP notifier backed by `lettre`'s async transport.

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use campuschat_core::notify::Notifier;
use campuschat_types::config::SmtpConfig;
use campuschat_types::error::NotifyError;

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("from address: {e}")))?;

        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self { transport, from })
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, NotifyError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("{to}: {e}")))?;

        let message_id = format!("<{}@campuschat>", Uuid::now_v7());
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        self.transport.send(email).await.map_err(|e| {
            tracing::error!(error = %e, "SMTP send failed");
            NotifyError::Transport(e.to_string())
        })?;

        tracing::debug!(message_id = %message_id, "mail handed to relay");
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.inst.edu".to_string(),
            username: "mailer".to_string(),
            password: "pw".to_string(),
            from_email: "noreply@inst.edu".to_string(),
            ..SmtpConfig::default()
        }
    }

    #[tokio::test]
    async fn test_builds_with_valid_from() {
        assert!(SmtpNotifier::new(&config()).is_ok());
    }

    #[tokio::test]
    async fn test_rejects_invalid_from() {
        let mut cfg = config();
        cfg.from_email = "not an address".to_string();
        assert!(matches!(
            SmtpNotifier::new(&cfg),
            Err(NotifyError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_invalid_recipient_before_connecting() {
        let notifier = SmtpNotifier::new(&config()).unwrap();
        let err = notifier.send("no-at-sign", "s", "b").await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress(_)));
    }
}
