use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::{MailError, Mailer, Notice};

/// A mailer that logs notices instead of delivering them.
///
/// Used when no SMTP relay is configured. Delivered notices are kept in
/// memory and can be inspected with [`LogMailer::sent`].
#[derive(Debug, Default)]
pub struct LogMailer {
    sent: Mutex<Vec<Notice>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices handed to this mailer so far, oldest first.
    pub async fn sent(&self) -> Vec<Notice> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, notice: &Notice) -> Result<(), MailError> {
        info!(
            to = %notice.recipient.email,
            template = %notice.template,
            subject = %notice.subject,
            "Mail delivery skipped (log mailer)"
        );
        self.sent.lock().await.push(notice.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Recipient;

    #[tokio::test]
    async fn test_records_sent_and_queued() {
        let mailer = LogMailer::new();
        let notice = Notice::new(
            "status",
            "Status changed",
            Recipient::new("Carol", "carol@example.com"),
            serde_json::Value::Null,
        );

        mailer.send(&notice).await.unwrap();
        mailer.queue(notice.clone()).await.unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], notice);
        assert_eq!(mailer.name(), "log");
    }
}
