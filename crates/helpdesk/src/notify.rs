//! Notification dispatch.
//!
//! Picks the counterparty for a ticket event and hands a [`Notice`] to the
//! mailer. Runs after the triggering write has committed; nothing here can
//! fail the caller.

use std::sync::Arc;

use helpdesk_db::{customer, staff, Database, Party, Ticket};
use serde_json::{json, Value};
use ticket_mailer::{Mailer, Notice, Recipient};
use tracing::{debug, info, warn};

use crate::config::HelpdeskConfig;

/// Something that happened to a ticket.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketEvent {
    NewTicket,
    Comment { content: String },
    StatusChanged { status: String },
    AgentChanged,
}

impl TicketEvent {
    /// Template name passed to the mailer.
    pub fn template(&self) -> &'static str {
        match self {
            TicketEvent::NewTicket => "new_ticket",
            TicketEvent::Comment { .. } => "comment",
            TicketEvent::StatusChanged { .. } => "status",
            TicketEvent::AgentChanged => "assigned",
        }
    }

    fn enabled(&self, config: &HelpdeskConfig) -> bool {
        match self {
            TicketEvent::NewTicket | TicketEvent::AgentChanged => config.assigned_notification,
            TicketEvent::Comment { .. } => config.comment_notification,
            TicketEvent::StatusChanged { .. } => config.status_notification,
        }
    }

    /// Whether the notice goes to the assigned agent regardless of who acted.
    fn targets_agent(&self) -> bool {
        matches!(self, TicketEvent::NewTicket | TicketEvent::AgentChanged)
    }
}

/// A party with a mail address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub party: Party,
    pub name: String,
    pub email: String,
}

impl Contact {
    fn recipient(&self) -> Recipient {
        Recipient::new(&self.name, &self.email)
    }
}

/// Decide who hears about an event.
///
/// Assignment events go to the agent. Comments and status changes go to
/// the other side of the conversation from the actor. A notice that would
/// reach the actor's own address is redirected to the agent, and dropped if
/// that is still the actor.
pub fn choose_recipient<'a>(
    event: &TicketEvent,
    actor: Option<&'a Contact>,
    requester: &'a Contact,
    agent: Option<&'a Contact>,
) -> Option<&'a Contact> {
    let recipient = if event.targets_agent() {
        agent?
    } else {
        match (actor, agent) {
            (Some(actor), Some(agent)) if actor.party == agent.party => requester,
            (Some(actor), Some(agent)) if actor.party == requester.party => agent,
            _ => requester,
        }
    };

    let Some(actor) = actor else {
        return Some(recipient);
    };

    if !actor.email.eq_ignore_ascii_case(&recipient.email) {
        return Some(recipient);
    }

    agent.filter(|agent| !agent.email.eq_ignore_ascii_case(&actor.email))
}

/// Sends ticket notifications through a [`Mailer`].
pub struct Notifier {
    db: Database,
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(db: Database, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, mailer }
    }

    /// Notify the counterparty of `event`. Errors are logged, never returned.
    pub async fn dispatch(
        &self,
        config: &HelpdeskConfig,
        event: TicketEvent,
        ticket: &Ticket,
        actor: Option<Party>,
    ) {
        if !event.enabled(config) {
            debug!(ticket_id = ticket.id, template = event.template(), "Notification disabled");
            return;
        }

        let requester = match self.contact(ticket.requester).await {
            Some(contact) => contact,
            None => {
                warn!(ticket_id = ticket.id, "Ticket requester not found, skipping notification");
                return;
            }
        };
        let agent = match ticket.agent_id {
            Some(id) => self.contact(Party::Staff(id)).await,
            None => None,
        };
        let actor = match actor {
            Some(party) => self.contact(party).await,
            None => None,
        };

        let Some(recipient) =
            choose_recipient(&event, actor.as_ref(), &requester, agent.as_ref())
        else {
            debug!(ticket_id = ticket.id, template = event.template(), "No recipient for notification");
            return;
        };

        let notice = Notice::new(
            event.template(),
            subject(&event, ticket),
            recipient.recipient(),
            payload(&event, ticket, actor.as_ref()),
        );

        let result = if config.queue_emails {
            self.mailer.queue(notice).await
        } else {
            self.mailer.send(&notice).await
        };

        match result {
            Ok(()) => info!(
                ticket_id = ticket.id,
                template = event.template(),
                to = %recipient.email,
                mailer = self.mailer.name(),
                "Notification sent"
            ),
            Err(err) => warn!(
                ticket_id = ticket.id,
                template = event.template(),
                error = %err,
                "Failed to send notification"
            ),
        }
    }

    async fn contact(&self, party: Party) -> Option<Contact> {
        let found = match party {
            Party::Customer(id) => customer::find_customer(self.db.pool(), id)
                .await
                .map(|row| row.map(|c| (c.name, c.email))),
            Party::Staff(id) => staff::find_staff(self.db.pool(), id)
                .await
                .map(|row| row.map(|s| (s.name, s.email))),
        };

        match found {
            Ok(Some((name, email))) => Some(Contact { party, name, email }),
            Ok(None) => None,
            Err(err) => {
                warn!(?party, error = %err, "Failed to load contact");
                None
            }
        }
    }
}

fn subject(event: &TicketEvent, ticket: &Ticket) -> String {
    match event {
        TicketEvent::NewTicket => format!("New ticket #{}: {}", ticket.id, ticket.subject),
        TicketEvent::Comment { .. } => {
            format!("New comment on ticket #{}: {}", ticket.id, ticket.subject)
        }
        TicketEvent::StatusChanged { status } => format!("Ticket #{} is now {}", ticket.id, status),
        TicketEvent::AgentChanged => format!("Ticket #{} has been assigned to you", ticket.id),
    }
}

fn payload(event: &TicketEvent, ticket: &Ticket, actor: Option<&Contact>) -> Value {
    let mut payload = json!({
        "ticket_id": ticket.id,
        "subject": ticket.subject,
        "actor": actor.map(|a| a.name.as_str()).unwrap_or("System"),
    });

    match event {
        TicketEvent::NewTicket => payload["content"] = json!(ticket.content),
        TicketEvent::Comment { content } => payload["comment"] = json!(content),
        TicketEvent::StatusChanged { status } => payload["status"] = json!(status),
        TicketEvent::AgentChanged => {}
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(party: Party, email: &str) -> Contact {
        Contact {
            party,
            name: email.split('@').next().unwrap_or_default().to_string(),
            email: email.to_string(),
        }
    }

    fn comment() -> TicketEvent {
        TicketEvent::Comment {
            content: "Any news?".to_string(),
        }
    }

    #[test]
    fn test_comment_goes_to_counterparty() {
        let requester = contact(Party::Customer(1), "carol@example.com");
        let agent = contact(Party::Staff(5), "alice@example.com");
        let admin = contact(Party::Staff(9), "root@example.com");

        // Agent comments → requester.
        let to = choose_recipient(&comment(), Some(&agent), &requester, Some(&agent));
        assert_eq!(to, Some(&requester));

        // Requester comments → agent.
        let to = choose_recipient(&comment(), Some(&requester), &requester, Some(&agent));
        assert_eq!(to, Some(&agent));

        // Someone else → requester.
        let to = choose_recipient(&comment(), Some(&admin), &requester, Some(&agent));
        assert_eq!(to, Some(&requester));
    }

    #[test]
    fn test_requester_comment_without_agent() {
        let requester = contact(Party::Customer(1), "carol@example.com");

        // Falls back to the requester, who is the actor, with no agent to redirect to.
        let to = choose_recipient(&comment(), Some(&requester), &requester, None);
        assert_eq!(to, None);
    }

    #[test]
    fn test_same_address_redirects_to_agent() {
        // Admin acting under the requester's address.
        let requester = contact(Party::Customer(1), "carol@example.com");
        let admin = contact(Party::Staff(9), "Carol@Example.com");
        let agent = contact(Party::Staff(5), "alice@example.com");

        let to = choose_recipient(&comment(), Some(&admin), &requester, Some(&agent));
        assert_eq!(to, Some(&agent));
    }

    #[test]
    fn test_assignment_goes_to_agent_unless_self() {
        let requester = contact(Party::Customer(1), "carol@example.com");
        let agent = contact(Party::Staff(5), "alice@example.com");

        let to = choose_recipient(&TicketEvent::NewTicket, Some(&requester), &requester, Some(&agent));
        assert_eq!(to, Some(&agent));

        let to = choose_recipient(&TicketEvent::AgentChanged, Some(&agent), &requester, Some(&agent));
        assert_eq!(to, None);

        let to = choose_recipient(&TicketEvent::NewTicket, Some(&requester), &requester, None);
        assert_eq!(to, None);
    }

    #[test]
    fn test_event_toggles() {
        let mut config = HelpdeskConfig::default();
        config.comment_notification = false;

        assert!(!comment().enabled(&config));
        assert!(TicketEvent::AgentChanged.enabled(&config));
        assert!(TicketEvent::StatusChanged {
            status: "Closed".to_string()
        }
        .enabled(&config));
    }
}
