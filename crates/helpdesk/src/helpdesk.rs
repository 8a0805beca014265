//! The helpdesk service: ticket lifecycle operations.
//!
//! Every operation follows the same shape: load, check permission, write,
//! audit, then notify once the write has landed.

use std::sync::Arc;

use helpdesk_db::ticket::{self as ticket_store, NewTicketRow, TicketQuery, Visibility};
use helpdesk_db::validation::{validate_content, validate_subject};
use helpdesk_db::{audit, comment, registry, staff, Comment, Database, Party, RegistryKind, Ticket};
use serde::{Deserialize, Serialize};
use ticket_mailer::Mailer;
use tracing::{debug, info, warn};

use crate::assignment;
use crate::config::HelpdeskConfig;
use crate::notify::{Notifier, TicketEvent};
use crate::outcome::{Denial, Outcome};
use crate::permissions;
use crate::principal::{self, Principal, PrincipalSource};
use crate::settings::Settings;
use crate::Result;

/// Input for a new ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub html: Option<String>,
    pub category_id: i64,
    pub priority_id: i64,
}

/// How the agent field of an update is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentSelector {
    /// Pick the least loaded agent of the ticket's category.
    Auto,
    /// Assign this agent.
    Explicit(i64),
}

/// Input for a staff edit of a ticket.
#[derive(Debug, Clone)]
pub struct TicketUpdate {
    pub subject: String,
    pub content: String,
    pub html: Option<String>,
    pub category_id: i64,
    pub priority_id: i64,
    pub status_id: i64,
    pub agent: AgentSelector,
}

/// Which tickets a listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketFilter {
    #[default]
    Active,
    Completed,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// A ticket with its comments, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketDetails {
    pub ticket: Ticket,
    pub comments: Vec<Comment>,
}

/// Ticket workflow over a database, settings store and mailer.
pub struct Helpdesk {
    pub(crate) db: Database,
    pub(crate) settings: Arc<Settings>,
    pub(crate) notifier: Notifier,
}

impl Helpdesk {
    /// Create a service with a settings store over the same database.
    pub fn new(db: Database, mailer: Arc<dyn Mailer>) -> Self {
        let settings = Arc::new(Settings::new(db.clone()));
        Self::with_settings(db, settings, mailer)
    }

    /// Create a service with an already configured settings store.
    pub fn with_settings(db: Database, settings: Arc<Settings>, mailer: Arc<dyn Mailer>) -> Self {
        let notifier = Notifier::new(db.clone(), mailer);
        Self {
            db,
            settings,
            notifier,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolve who is making a request from the two session contexts.
    pub async fn resolve_principal(
        &self,
        customer: &dyn PrincipalSource,
        staff_source: &dyn PrincipalSource,
    ) -> Result<Principal> {
        principal::resolve_principal(&self.db, customer, staff_source).await
    }

    /// Append an audit entry. Failures are logged, not returned.
    pub(crate) async fn audit(&self, operation: &str, actor: Option<Party>, ticket_id: Option<i64>) {
        if let Err(err) = audit::record(self.db.pool(), operation, actor, ticket_id).await {
            warn!(operation, ?ticket_id, error = %err, "Failed to write audit entry");
        }
    }

    async fn registry_exists(&self, kind: RegistryKind, id: i64) -> Result<bool> {
        Ok(registry::find_entry(self.db.pool(), kind, id).await?.is_some())
    }

    /// Open a ticket. Customers and any staff user may do this.
    ///
    /// The ticket starts in the configured default status and is
    /// auto-assigned within its category.
    pub async fn create_ticket(
        &self,
        principal: &Principal,
        input: NewTicket,
    ) -> Result<Outcome<Ticket>> {
        let Some(requester) = principal.party() else {
            return Ok(Outcome::Denied(Denial::Unauthenticated));
        };

        validate_subject(&input.subject)?;
        validate_content(&input.content)?;

        if !self.registry_exists(RegistryKind::Category, input.category_id).await? {
            return Ok(Outcome::not_found("Category", input.category_id));
        }
        if !self.registry_exists(RegistryKind::Priority, input.priority_id).await? {
            return Ok(Outcome::not_found("Priority", input.priority_id));
        }

        let config = self.settings.config().await;
        if !self.registry_exists(RegistryKind::Status, config.default_status_id).await? {
            return Ok(Outcome::not_found("Status", config.default_status_id));
        }

        let agent_id = assignment::select_agent(&self.db, input.category_id, None).await?;

        let id = ticket_store::create_ticket_audited(
            self.db.pool(),
            &NewTicketRow {
                subject: input.subject.trim(),
                content: &input.content,
                html: input.html.as_deref(),
                status_id: config.default_status_id,
                priority_id: input.priority_id,
                category_id: input.category_id,
                agent_id,
                requester,
            },
        )
        .await?;

        let ticket = ticket_store::get_ticket(self.db.pool(), id).await?;
        info!(ticket_id = id, ?requester, ?agent_id, "Ticket created");

        self.notifier
            .dispatch(&config, TicketEvent::NewTicket, &ticket, Some(requester))
            .await;

        Ok(Outcome::Done(ticket))
    }

    /// A ticket with its comments.
    pub async fn show_ticket(
        &self,
        principal: &Principal,
        id: i64,
    ) -> Result<Outcome<TicketDetails>> {
        let Some(ticket) = ticket_store::find_ticket(self.db.pool(), id).await? else {
            return Ok(Outcome::not_found("Ticket", id));
        };

        if !permissions::can_view(principal, &ticket) {
            return Ok(Outcome::Denied(Denial::View));
        }

        let comments = comment::list_comments(self.db.pool(), id).await?;
        Ok(Outcome::Done(TicketDetails { ticket, comments }))
    }

    /// Tickets visible to the principal, one page at a time. Pages start at 1.
    pub async fn list_tickets(
        &self,
        principal: &Principal,
        filter: TicketFilter,
        page: i64,
    ) -> Result<Outcome<Page<Ticket>>> {
        let visibility = match principal {
            Principal::Anonymous => return Ok(Outcome::Denied(Denial::Unauthenticated)),
            _ if principal.is_admin() => Visibility::All,
            Principal::Staff(staff) if principal.is_agent() => Visibility::Agent(staff.id),
            Principal::Staff(staff) => Visibility::Requester(Party::Staff(staff.id)),
            Principal::Customer { id } => Visibility::Requester(Party::Customer(*id)),
        };

        let config = self.settings.config().await;
        let page = page.max(1);
        let per_page = config.paginate_items;
        let query = TicketQuery {
            visibility,
            completed: filter == TicketFilter::Completed,
            limit: per_page,
            offset: (page - 1).saturating_mul(per_page),
        };

        let items = ticket_store::list_tickets(self.db.pool(), &query).await?;
        let total = ticket_store::count_tickets(self.db.pool(), &query).await?;

        Ok(Outcome::Done(Page {
            items,
            page,
            per_page,
            total,
        }))
    }

    /// Mark a ticket complete. Closing a closed ticket refreshes its
    /// completion time.
    pub async fn close_ticket(&self, principal: &Principal, id: i64) -> Result<Outcome<Ticket>> {
        let Some(before) = ticket_store::find_ticket(self.db.pool(), id).await? else {
            return Ok(Outcome::not_found("Ticket", id));
        };

        let config = self.settings.config().await;
        if !permissions::can_close(principal, &before, &config.close_ticket_perm) {
            debug!(ticket_id = id, kind = ?principal.kind(), "Close denied");
            return Ok(Outcome::Denied(Denial::Close));
        }

        ticket_store::mark_completed(self.db.pool(), id, config.default_close_status_id).await?;
        self.audit("completed", principal.party(), Some(id)).await;

        let ticket = ticket_store::get_ticket(self.db.pool(), id).await?;
        info!(ticket_id = id, status_id = ticket.status_id, "Ticket closed");

        self.notify_status_change(&config, &before, &ticket, principal).await;
        Ok(Outcome::Done(ticket))
    }

    /// Reopen a completed ticket.
    pub async fn reopen_ticket(&self, principal: &Principal, id: i64) -> Result<Outcome<Ticket>> {
        let Some(before) = ticket_store::find_ticket(self.db.pool(), id).await? else {
            return Ok(Outcome::not_found("Ticket", id));
        };

        let config = self.settings.config().await;
        if !permissions::can_reopen(principal, &before, &config.reopen_ticket_perm) {
            debug!(ticket_id = id, kind = ?principal.kind(), "Reopen denied");
            return Ok(Outcome::Denied(Denial::Reopen));
        }

        ticket_store::mark_reopened(self.db.pool(), id, config.default_reopen_status_id).await?;
        self.audit("reopened", principal.party(), Some(id)).await;

        let ticket = ticket_store::get_ticket(self.db.pool(), id).await?;
        info!(ticket_id = id, status_id = ticket.status_id, "Ticket reopened");

        self.notify_status_change(&config, &before, &ticket, principal).await;
        Ok(Outcome::Done(ticket))
    }

    /// Staff edit of a ticket's fields. Completion is left alone.
    pub async fn update_ticket(
        &self,
        principal: &Principal,
        id: i64,
        update: TicketUpdate,
    ) -> Result<Outcome<Ticket>> {
        if !permissions::can_update(principal) {
            return Ok(Outcome::Denied(Denial::Update));
        }

        let Some(before) = ticket_store::find_ticket(self.db.pool(), id).await? else {
            return Ok(Outcome::not_found("Ticket", id));
        };

        if !permissions::can_view(principal, &before) {
            return Ok(Outcome::Denied(Denial::View));
        }

        validate_subject(&update.subject)?;
        validate_content(&update.content)?;

        for (kind, entry_id) in [
            (RegistryKind::Category, update.category_id),
            (RegistryKind::Priority, update.priority_id),
            (RegistryKind::Status, update.status_id),
        ] {
            if !self.registry_exists(kind, entry_id).await? {
                return Ok(Outcome::not_found(kind.entity(), entry_id));
            }
        }

        let agent_id = match update.agent {
            AgentSelector::Explicit(agent_id) => {
                match staff::find_staff(self.db.pool(), agent_id).await? {
                    Some(user) if user.is_agent => Some(agent_id),
                    _ => return Ok(Outcome::not_found("Agent", agent_id)),
                }
            }
            AgentSelector::Auto => {
                assignment::select_agent(&self.db, update.category_id, before.agent_id).await?
            }
        };

        let edited = Ticket {
            subject: update.subject.trim().to_string(),
            content: update.content,
            html: update.html,
            category_id: update.category_id,
            priority_id: update.priority_id,
            status_id: update.status_id,
            agent_id,
            ..before.clone()
        };
        ticket_store::update_ticket(self.db.pool(), &edited).await?;
        self.audit("updated", principal.party(), Some(id)).await;

        let ticket = ticket_store::get_ticket(self.db.pool(), id).await?;
        info!(ticket_id = id, ?agent_id, status_id = ticket.status_id, "Ticket updated");

        let config = self.settings.config().await;
        self.notify_status_change(&config, &before, &ticket, principal).await;
        if ticket.agent_id.is_some() && ticket.agent_id != before.agent_id {
            self.notifier
                .dispatch(&config, TicketEvent::AgentChanged, &ticket, principal.party())
                .await;
        }

        Ok(Outcome::Done(ticket))
    }

    /// Delete a ticket and its comments. Admin only.
    pub async fn delete_ticket(&self, principal: &Principal, id: i64) -> Result<Outcome<()>> {
        if !permissions::can_delete(principal) {
            return Ok(Outcome::Denied(Denial::Delete));
        }

        if ticket_store::find_ticket(self.db.pool(), id).await?.is_none() {
            return Ok(Outcome::not_found("Ticket", id));
        }

        ticket_store::delete_ticket(self.db.pool(), id).await?;
        self.audit("deleted", principal.party(), Some(id)).await;
        info!(ticket_id = id, "Ticket deleted");

        Ok(Outcome::Done(()))
    }

    async fn notify_status_change(
        &self,
        config: &HelpdeskConfig,
        before: &Ticket,
        after: &Ticket,
        principal: &Principal,
    ) {
        if before.status_id == after.status_id {
            return;
        }

        let status = match registry::find_entry(self.db.pool(), RegistryKind::Status, after.status_id)
            .await
        {
            Ok(Some(entry)) => entry.name,
            Ok(None) => after.status_id.to_string(),
            Err(err) => {
                warn!(ticket_id = after.id, error = %err, "Failed to load status name");
                after.status_id.to_string()
            }
        };

        self.notifier
            .dispatch(
                config,
                TicketEvent::StatusChanged { status },
                after,
                principal.party(),
            )
            .await;
    }
}
