//! Customer operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Customer;

/// Create a customer, returning its id.
pub async fn create_customer(pool: &SqlitePool, name: &str, email: &str) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO customers (name, email)
        VALUES (?, ?)
        "#,
    )
    .bind(name)
    .bind(email)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_write(e, "Customer", email))?;

    Ok(result.last_insert_rowid())
}

/// Get a customer by ID if present.
pub async fn find_customer(pool: &SqlitePool, id: i64) -> Result<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, name, email, created_at, updated_at
        FROM customers
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(customer)
}
