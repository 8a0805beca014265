//! # helpdesk
//!
//! Ticketing core: customers open tickets, staff triage, comment,
//! reassign and resolve them.
//!
//! [`Helpdesk`] is the entry point. Each operation takes the acting
//! [`Principal`] and returns an [`Outcome`]: the result, a [`Denial`], or
//! a missing record. Store failures and bad input are [`HelpdeskError`]s.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use helpdesk::{Helpdesk, NewTicket, Outcome};
//! use helpdesk_db::Database;
//! use ticket_mailer::LogMailer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:helpdesk.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let helpdesk = Helpdesk::new(db, Arc::new(LogMailer::new()));
//!     let principal = helpdesk.resolve_principal(&Some(1_i64), &None::<i64>).await?;
//!
//!     let ticket = NewTicket {
//!         subject: "Printer on fire".to_string(),
//!         content: "Smoke coming out of tray 2".to_string(),
//!         html: None,
//!         category_id: 1,
//!         priority_id: 1,
//!     };
//!     if let Outcome::Done(ticket) = helpdesk.create_ticket(&principal, ticket).await? {
//!         println!("opened #{}", ticket.id);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod assignment;
pub mod cache;
pub mod comments;
pub mod config;
pub mod error;
pub mod helpdesk;
pub mod notify;
pub mod outcome;
pub mod permissions;
pub mod principal;
pub mod serialized;
pub mod settings;

pub use admin::EntryInput;
pub use cache::{SettingsCache, DEFAULT_TTL};
pub use comments::NewComment;
pub use config::{HelpdeskConfig, RolePermissions};
pub use error::{HelpdeskError, Result};
pub use helpdesk::{
    AgentSelector, Helpdesk, NewTicket, Page, TicketDetails, TicketFilter, TicketUpdate,
};
pub use notify::{Contact, Notifier, TicketEvent};
pub use outcome::{Denial, Outcome};
pub use principal::{
    resolve_principal, Principal, PrincipalKind, PrincipalSource, Role, RoleSet, StaffIdentity,
};
pub use settings::{Settings, StaticTranslations, Translator};
