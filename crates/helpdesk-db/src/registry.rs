//! Status, priority and category tables.
//!
//! The three tables share the same columns, so one set of operations serves
//! all of them, keyed by [`RegistryKind`].

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::RegistryEntry;

/// Which reference-data table to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    Status,
    Priority,
    Category,
}

impl RegistryKind {
    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            RegistryKind::Status => "statuses",
            RegistryKind::Priority => "priorities",
            RegistryKind::Category => "categories",
        }
    }

    /// Entity name used in errors and logs.
    pub fn entity(&self) -> &'static str {
        match self {
            RegistryKind::Status => "Status",
            RegistryKind::Priority => "Priority",
            RegistryKind::Category => "Category",
        }
    }

    /// Colour applied when none is given.
    pub fn default_color(&self) -> &'static str {
        match self {
            RegistryKind::Status => "#0014f4",
            RegistryKind::Priority => "#069500",
            RegistryKind::Category => "#000000",
        }
    }
}

/// Insert a row, returning its id.
pub async fn create_entry(
    pool: &SqlitePool,
    kind: RegistryKind,
    name: &str,
    color: &str,
) -> Result<i64> {
    let result = sqlx::query(&format!(
        "INSERT INTO {} (name, color) VALUES (?, ?)",
        kind.table()
    ))
    .bind(name)
    .bind(color)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_write(e, kind.entity(), name))?;

    Ok(result.last_insert_rowid())
}

/// Get a row by ID.
pub async fn get_entry(pool: &SqlitePool, kind: RegistryKind, id: i64) -> Result<RegistryEntry> {
    find_entry(pool, kind, id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: kind.entity(),
            id: id.to_string(),
        })
}

/// Get a row by ID if present.
pub async fn find_entry(
    pool: &SqlitePool,
    kind: RegistryKind,
    id: i64,
) -> Result<Option<RegistryEntry>> {
    let entry = sqlx::query_as::<_, RegistryEntry>(&format!(
        "SELECT id, name, color, created_at, updated_at FROM {} WHERE id = ?",
        kind.table()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Find a row by name, ignoring ASCII case.
pub async fn find_entry_by_name(
    pool: &SqlitePool,
    kind: RegistryKind,
    name: &str,
) -> Result<Option<RegistryEntry>> {
    let entry = sqlx::query_as::<_, RegistryEntry>(&format!(
        "SELECT id, name, color, created_at, updated_at FROM {} WHERE name = ? COLLATE NOCASE",
        kind.table()
    ))
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Rename / recolour a row.
pub async fn update_entry(
    pool: &SqlitePool,
    kind: RegistryKind,
    id: i64,
    name: &str,
    color: &str,
) -> Result<()> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET name = ?, color = ?, updated_at = datetime('now') WHERE id = ?",
        kind.table()
    ))
    .bind(name)
    .bind(color)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: kind.entity(),
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete a row. Fails with [`DatabaseError::InUse`] while tickets reference it.
pub async fn delete_entry(pool: &SqlitePool, kind: RegistryKind, id: i64) -> Result<()> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, kind.entity(), id))?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: kind.entity(),
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all rows ordered by name.
pub async fn list_entries(pool: &SqlitePool, kind: RegistryKind) -> Result<Vec<RegistryEntry>> {
    let entries = sqlx::query_as::<_, RegistryEntry>(&format!(
        "SELECT id, name, color, created_at, updated_at FROM {} ORDER BY name",
        kind.table()
    ))
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
