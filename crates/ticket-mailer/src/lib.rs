//! # ticket-mailer
//!
//! Mail collaborator for helpdesk notifications.
//!
//! The helpdesk core composes a [`Notice`] (template name, subject,
//! recipient, payload) and hands it to a [`Mailer`]. This crate ships an
//! SMTP implementation and a logging one for environments without a relay.
//!
//! ## Sending a notice
//!
//! ```no_run
//! use ticket_mailer::{Mailer, Notice, Recipient, SmtpConfig, SmtpMailer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ticket_mailer::MailError> {
//!     let config = SmtpConfig::from_env()?;
//!     let mailer = SmtpMailer::new(config)?;
//!
//!     let notice = Notice::new(
//!         "comment",
//!         "New comment on ticket #12",
//!         Recipient::new("Carol", "carol@example.com"),
//!         serde_json::json!({ "ticket_id": 12 }),
//!     );
//!     mailer.send(&notice).await?;
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod log;
mod mailer;
mod notice;
mod smtp;

pub use config::SmtpConfig;
pub use error::MailError;
pub use log::LogMailer;
pub use mailer::Mailer;
pub use notice::{Notice, Recipient};
pub use smtp::SmtpMailer;
