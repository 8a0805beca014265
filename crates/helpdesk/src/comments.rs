//! Comment operations.

use helpdesk_db::comment as comment_store;
use helpdesk_db::ticket as ticket_store;
use helpdesk_db::validation::validate_content;
use helpdesk_db::Comment;
use serde::Deserialize;
use tracing::info;

use crate::helpdesk::Helpdesk;
use crate::notify::TicketEvent;
use crate::outcome::{Denial, Outcome};
use crate::permissions;
use crate::principal::Principal;
use crate::Result;

/// Input for a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub content: String,
    #[serde(default)]
    pub html: Option<String>,
}

impl Helpdesk {
    /// Comment on a ticket.
    ///
    /// The comment and its audit entry are written together; a refused or
    /// failed comment leaves neither behind.
    pub async fn add_comment(
        &self,
        principal: &Principal,
        ticket_id: i64,
        input: NewComment,
    ) -> Result<Outcome<Comment>> {
        let Some(ticket) = ticket_store::find_ticket(self.db.pool(), ticket_id).await? else {
            return Ok(Outcome::not_found("Ticket", ticket_id));
        };

        let Some(author) = principal.party() else {
            return Ok(Outcome::Denied(Denial::Unauthenticated));
        };
        if !permissions::can_comment(principal, &ticket) {
            return Ok(Outcome::Denied(Denial::Comment));
        }

        validate_content(&input.content)?;

        let id = comment_store::create_comment_audited(
            self.db.pool(),
            ticket_id,
            author,
            &input.content,
            input.html.as_deref(),
        )
        .await?;
        let comment = comment_store::get_comment(self.db.pool(), id).await?;
        info!(ticket_id, comment_id = id, ?author, "Comment added");

        let config = self.settings.config().await;
        self.notifier
            .dispatch(
                &config,
                TicketEvent::Comment {
                    content: comment.content.clone(),
                },
                &ticket,
                Some(author),
            )
            .await;

        Ok(Outcome::Done(comment))
    }

    /// Replace a comment's content.
    pub async fn edit_comment(
        &self,
        principal: &Principal,
        id: i64,
        input: NewComment,
    ) -> Result<Outcome<Comment>> {
        let Some(existing) = comment_store::find_comment(self.db.pool(), id).await? else {
            return Ok(Outcome::not_found("Comment", id));
        };

        if !permissions::can_edit_comment(principal, &existing) {
            return Ok(Outcome::Denied(Denial::EditComment));
        }

        validate_content(&input.content)?;

        comment_store::update_comment(self.db.pool(), id, &input.content, input.html.as_deref())
            .await?;
        self.audit("comment_updated", principal.party(), Some(existing.ticket_id))
            .await;

        let comment = comment_store::get_comment(self.db.pool(), id).await?;
        info!(comment_id = id, ticket_id = comment.ticket_id, "Comment edited");
        Ok(Outcome::Done(comment))
    }

    /// Remove a comment. Admin only.
    pub async fn delete_comment(&self, principal: &Principal, id: i64) -> Result<Outcome<()>> {
        let Some(existing) = comment_store::find_comment(self.db.pool(), id).await? else {
            return Ok(Outcome::not_found("Comment", id));
        };

        if !permissions::can_delete_comment(principal, &existing) {
            return Ok(Outcome::Denied(Denial::DeleteComment));
        }

        comment_store::delete_comment(self.db.pool(), id).await?;
        self.audit("comment_deleted", principal.party(), Some(existing.ticket_id))
            .await;
        info!(comment_id = id, ticket_id = existing.ticket_id, "Comment deleted");

        Ok(Outcome::Done(()))
    }
}
