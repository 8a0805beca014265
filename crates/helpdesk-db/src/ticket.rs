//! Ticket persistence.

use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

use crate::audit;
use crate::error::{DatabaseError, Result};
use crate::models::{Party, Ticket};

const COLUMNS: &str = "id, subject, content, html, status_id, priority_id, category_id, \
                       agent_id, customer_id, user_id, completed_at, created_at, updated_at";

/// Fields for a new ticket row.
#[derive(Debug, Clone)]
pub struct NewTicketRow<'a> {
    pub subject: &'a str,
    pub content: &'a str,
    pub html: Option<&'a str>,
    pub status_id: i64,
    pub priority_id: i64,
    pub category_id: i64,
    pub agent_id: Option<i64>,
    pub requester: Party,
}

/// Which tickets a listing may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every ticket.
    All,
    /// Tickets assigned to the agent, unassigned tickets, and tickets the
    /// agent opened.
    Agent(i64),
    /// Tickets opened by this party.
    Requester(Party),
}

/// Filter for [`list_tickets`] / [`count_tickets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketQuery {
    pub visibility: Visibility,
    /// `false` for open tickets, `true` for completed ones.
    pub completed: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Insert a ticket, returning its id.
pub async fn create_ticket<'e, E>(executor: E, ticket: &NewTicketRow<'_>) -> Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO tickets
            (subject, content, html, status_id, priority_id, category_id, agent_id, customer_id, user_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(ticket.subject)
    .bind(ticket.content)
    .bind(ticket.html)
    .bind(ticket.status_id)
    .bind(ticket.priority_id)
    .bind(ticket.category_id)
    .bind(ticket.agent_id)
    .bind(ticket.requester.customer_id())
    .bind(ticket.requester.user_id())
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert a ticket together with its "created" audit entry, atomically.
pub async fn create_ticket_audited(pool: &SqlitePool, ticket: &NewTicketRow<'_>) -> Result<i64> {
    let mut tx = pool.begin().await?;

    let id = create_ticket(&mut *tx, ticket).await?;
    audit::record(&mut *tx, "created", Some(ticket.requester), Some(id)).await?;

    tx.commit().await?;
    Ok(id)
}

/// Get a ticket by ID.
pub async fn get_ticket(pool: &SqlitePool, id: i64) -> Result<Ticket> {
    find_ticket(pool, id).await?.ok_or_else(|| DatabaseError::NotFound {
        entity: "Ticket",
        id: id.to_string(),
    })
}

/// Get a ticket by ID if present.
pub async fn find_ticket(pool: &SqlitePool, id: i64) -> Result<Option<Ticket>> {
    let ticket = sqlx::query_as::<_, Ticket>(&format!(
        "SELECT {COLUMNS} FROM tickets WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(ticket)
}

/// Write back the editable fields of a ticket.
///
/// Completion state is not touched; use [`mark_completed`] / [`mark_reopened`].
pub async fn update_ticket(pool: &SqlitePool, ticket: &Ticket) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE tickets
        SET subject = ?, content = ?, html = ?, status_id = ?, priority_id = ?,
            category_id = ?, agent_id = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&ticket.subject)
    .bind(&ticket.content)
    .bind(&ticket.html)
    .bind(ticket.status_id)
    .bind(ticket.priority_id)
    .bind(ticket.category_id)
    .bind(ticket.agent_id)
    .bind(ticket.id)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_write(e, "Ticket", ticket.id))?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Ticket",
            id: ticket.id.to_string(),
        });
    }

    Ok(())
}

/// Stamp `completed_at` with the current time and optionally move the status.
pub async fn mark_completed(pool: &SqlitePool, id: i64, status_id: Option<i64>) -> Result<()> {
    set_completion(pool, id, true, status_id).await
}

/// Clear `completed_at` and optionally move the status.
pub async fn mark_reopened(pool: &SqlitePool, id: i64, status_id: Option<i64>) -> Result<()> {
    set_completion(pool, id, false, status_id).await
}

async fn set_completion(
    pool: &SqlitePool,
    id: i64,
    completed: bool,
    status_id: Option<i64>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE tickets
        SET completed_at = CASE WHEN ? THEN datetime('now') ELSE NULL END,
            status_id = COALESCE(?, status_id),
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(completed)
    .bind(status_id)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_write(e, "Ticket", id))?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Ticket",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete a ticket. Its comments go with it.
pub async fn delete_ticket(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Ticket",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Count open tickets assigned to an agent.
pub async fn count_open_for_agent(pool: &SqlitePool, agent_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM tickets
        WHERE agent_id = ? AND completed_at IS NULL
        "#,
    )
    .bind(agent_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, query: &TicketQuery) {
    if query.completed {
        builder.push(" WHERE completed_at IS NOT NULL");
    } else {
        builder.push(" WHERE completed_at IS NULL");
    }

    match query.visibility {
        Visibility::All => {}
        Visibility::Agent(agent_id) => {
            builder
                .push(" AND (agent_id IS NULL OR agent_id = ")
                .push_bind(agent_id)
                .push(" OR user_id = ")
                .push_bind(agent_id)
                .push(")");
        }
        Visibility::Requester(Party::Customer(id)) => {
            builder.push(" AND customer_id = ").push_bind(id);
        }
        Visibility::Requester(Party::Staff(id)) => {
            builder.push(" AND user_id = ").push_bind(id);
        }
    }
}

/// List tickets matching a query, newest first.
pub async fn list_tickets(pool: &SqlitePool, query: &TicketQuery) -> Result<Vec<Ticket>> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM tickets"));
    push_filter(&mut builder, query);
    builder
        .push(" ORDER BY updated_at DESC, id DESC LIMIT ")
        .push_bind(query.limit)
        .push(" OFFSET ")
        .push_bind(query.offset);

    let tickets = builder.build_query_as::<Ticket>().fetch_all(pool).await?;
    Ok(tickets)
}

/// Count tickets matching a query, ignoring limit and offset.
pub async fn count_tickets(pool: &SqlitePool, query: &TicketQuery) -> Result<i64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tickets");
    push_filter(&mut builder, query);

    let count = builder.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(count)
}
