//! Append-only audit log.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::{Audit, Party};
use crate::Result;

/// Append an audit entry.
pub async fn record<'e, E>(
    executor: E,
    operation: &str,
    actor: Option<Party>,
    ticket_id: Option<i64>,
) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO audits (operation, user_id, customer_id, ticket_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(operation)
    .bind(actor.and_then(|a| a.user_id()))
    .bind(actor.and_then(|a| a.customer_id()))
    .bind(ticket_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Audit entries recorded for a ticket, oldest first.
pub async fn list_for_ticket(pool: &SqlitePool, ticket_id: i64) -> Result<Vec<Audit>> {
    let rows = sqlx::query_as::<_, Audit>(
        r#"
        SELECT id, operation, user_id, customer_id, ticket_id, created_at
        FROM audits
        WHERE ticket_id = ?
        ORDER BY id
        "#,
    )
    .bind(ticket_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
