use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, instrument, warn};

use crate::{MailError, Mailer, Notice, SmtpConfig};

/// Mailer that delivers notices through an SMTP relay.
///
/// Uses connection pooling; cloning shares the pool.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Create a new mailer with the given configuration.
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(config.username.clone(), config.password().to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(creds)
            .build();

        info!(
            host = %config.host,
            port = config.port,
            from = %config.from_address,
            "Created SMTP mailer"
        );

        Ok(Self {
            transport,
            from: format!("{} <{}>", config.from_name, config.from_address),
        })
    }

    /// Build a lettre Message from a notice.
    fn build_message(&self, notice: &Notice) -> Result<Message, MailError> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("From: {}", e)))?;

        let to: Mailbox = format!("{} <{}>", notice.recipient.name, notice.recipient.email)
            .parse::<Mailbox>()
            .or_else(|_| notice.recipient.email.parse::<Mailbox>())
            .map_err(|e| {
                MailError::InvalidAddress(format!("To '{}': {}", notice.recipient.email, e))
            })?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&notice.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(notice.render_text())
            .map_err(|e| MailError::BuildEmail(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, notice), fields(to = %notice.recipient.email, template = %notice.template))]
    async fn send(&self, notice: &Notice) -> Result<(), MailError> {
        let message = self.build_message(notice)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        info!(to = %notice.recipient.email, subject = %notice.subject, "Email sent successfully");
        Ok(())
    }

    /// Validates the notice, then delivers it from a background task.
    async fn queue(&self, notice: Notice) -> Result<(), MailError> {
        self.build_message(&notice)?;

        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(err) = mailer.send(&notice).await {
                warn!(to = %notice.recipient.email, error = %err, "Queued email failed");
            }
        });

        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Recipient;

    fn mailer() -> SmtpMailer {
        let config = SmtpConfig::new("smtp.example.com", 587, "desk@example.com", "secret")
            .with_from("desk@example.com", "Support Desk");
        SmtpMailer::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_build_message() {
        let notice = Notice::new(
            "comment",
            "New comment on ticket #3",
            Recipient::new("Carol", "carol@example.com"),
            serde_json::json!({ "ticket_id": 3 }),
        );

        let message = mailer().build_message(&notice).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: New comment on ticket #3"));
        assert!(raw.contains("carol@example.com"));
        assert!(raw.contains("Support Desk"));
    }

    #[tokio::test]
    async fn test_invalid_recipient() {
        let notice = Notice::new(
            "comment",
            "Subject",
            Recipient::new("Nobody", "not-an-address"),
            serde_json::Value::Null,
        );

        let result = mailer().build_message(&notice);
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }
}
