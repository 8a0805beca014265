//! The Mailer trait.

use async_trait::async_trait;

use crate::{MailError, Notice};

/// A transport that delivers notices.
///
/// This trait is object-safe and can be used with `Arc<dyn Mailer>`.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a notice now.
    async fn send(&self, notice: &Notice) -> Result<(), MailError>;

    /// Hand a notice off for deferred delivery.
    ///
    /// Default implementation delivers immediately.
    async fn queue(&self, notice: Notice) -> Result<(), MailError> {
        self.send(&notice).await
    }

    /// Get a human-readable name for this transport.
    fn name(&self) -> &str;
}
