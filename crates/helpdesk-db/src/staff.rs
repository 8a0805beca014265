//! Staff user and agent operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::StaffUser;

const COLUMNS: &str = "id, name, email, is_agent, is_admin, created_at, updated_at";

/// Fields for a new staff user.
#[derive(Debug, Clone)]
pub struct NewStaffUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub is_agent: bool,
    pub is_admin: bool,
}

/// Create a staff user, returning its id.
pub async fn create_staff(pool: &SqlitePool, user: &NewStaffUser<'_>) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, is_agent, is_admin)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.is_agent)
    .bind(user.is_admin)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_write(e, "User", user.email))?;

    Ok(result.last_insert_rowid())
}

/// Get a staff user by ID if present.
pub async fn find_staff(pool: &SqlitePool, id: i64) -> Result<Option<StaffUser>> {
    let user = sqlx::query_as::<_, StaffUser>(&format!(
        "SELECT {COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Agents that can be auto-assigned tickets from a category, ordered by id.
pub async fn list_category_agents(pool: &SqlitePool, category_id: i64) -> Result<Vec<StaffUser>> {
    let agents = sqlx::query_as::<_, StaffUser>(
        r#"
        SELECT u.id, u.name, u.email, u.is_agent, u.is_admin, u.created_at, u.updated_at
        FROM users u
        INNER JOIN category_agent ca ON ca.user_id = u.id
        WHERE ca.category_id = ? AND u.is_agent = 1
        ORDER BY u.id
        "#,
    )
    .bind(category_id)
    .fetch_all(pool)
    .await?;

    Ok(agents)
}

/// Replace the set of agents attached to a category.
pub async fn sync_category_agents(
    pool: &SqlitePool,
    category_id: i64,
    agent_ids: &[i64],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM category_agent WHERE category_id = ?")
        .bind(category_id)
        .execute(&mut *tx)
        .await?;

    for agent_id in agent_ids {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO category_agent (category_id, user_id)
            VALUES (?, ?)
            "#,
        )
        .bind(category_id)
        .bind(agent_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "Category agent", format!("{}/{}", category_id, agent_id)))?;
    }

    tx.commit().await?;
    Ok(())
}
