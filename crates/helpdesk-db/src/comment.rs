//! Comment persistence.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::audit;
use crate::error::{DatabaseError, Result};
use crate::models::{Comment, Party};

/// Insert a comment, returning its id.
pub async fn create_comment<'e, E>(
    executor: E,
    ticket_id: i64,
    author: Party,
    content: &str,
    html: Option<&str>,
) -> Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO comments (ticket_id, user_id, customer_id, content, html)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(ticket_id)
    .bind(author.user_id())
    .bind(author.customer_id())
    .bind(content)
    .bind(html)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert a comment together with its audit entry, atomically.
///
/// Either both rows are written or neither is.
pub async fn create_comment_audited(
    pool: &SqlitePool,
    ticket_id: i64,
    author: Party,
    content: &str,
    html: Option<&str>,
) -> Result<i64> {
    let mut tx = pool.begin().await?;

    let id = create_comment(&mut *tx, ticket_id, author, content, html).await?;
    audit::record(&mut *tx, "commented", Some(author), Some(ticket_id)).await?;

    tx.commit().await?;
    Ok(id)
}

/// Get a comment by ID.
pub async fn get_comment(pool: &SqlitePool, id: i64) -> Result<Comment> {
    find_comment(pool, id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Comment",
            id: id.to_string(),
        })
}

/// Get a comment by ID if present.
pub async fn find_comment(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, ticket_id, content, html, user_id, customer_id, created_at, updated_at
        FROM comments
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(comment)
}

/// Replace the content of a comment.
pub async fn update_comment(
    pool: &SqlitePool,
    id: i64,
    content: &str,
    html: Option<&str>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE comments
        SET content = ?, html = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(content)
    .bind(html)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Comment",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete a comment by ID.
pub async fn delete_comment(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Comment",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List the comments of a ticket, oldest first.
pub async fn list_comments(pool: &SqlitePool, ticket_id: i64) -> Result<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, ticket_id, content, html, user_id, customer_id, created_at, updated_at
        FROM comments
        WHERE ticket_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(ticket_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

/// Count comments on a ticket.
pub async fn count_comments(pool: &SqlitePool, ticket_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE ticket_id = ?")
        .bind(ticket_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
