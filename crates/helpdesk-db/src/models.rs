//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// A staff identity. Agents and admins are flags on the same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StaffUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// May be assigned tickets.
    pub is_agent: bool,
    /// Unrestricted access.
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// An external requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One of the two identity tables a ticket or comment can point at.
///
/// Tickets and comments carry exactly one of `customer_id` / `user_id`;
/// this enum is that invariant in type form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Party {
    Customer(i64),
    Staff(i64),
}

impl Party {
    /// The `customer_id` column value.
    pub fn customer_id(&self) -> Option<i64> {
        match self {
            Party::Customer(id) => Some(*id),
            Party::Staff(_) => None,
        }
    }

    /// The `user_id` column value.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Party::Staff(id) => Some(*id),
            Party::Customer(_) => None,
        }
    }

    fn from_columns(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let customer_id: Option<i64> = row.try_get("customer_id")?;
        let user_id: Option<i64> = row.try_get("user_id")?;
        match (customer_id, user_id) {
            (Some(id), None) => Ok(Party::Customer(id)),
            (None, Some(id)) => Ok(Party::Staff(id)),
            _ => Err(sqlx::Error::ColumnDecode {
                index: "customer_id/user_id".to_string(),
                source: "exactly one of customer_id and user_id must be set".into(),
            }),
        }
    }
}

/// A status, priority or category row. All three share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RegistryEntry {
    pub id: i64,
    pub name: String,
    /// Hex colour, e.g. `#0014f4`.
    pub color: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A support ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub subject: String,
    pub content: String,
    pub html: Option<String>,
    pub status_id: i64,
    pub priority_id: i64,
    pub category_id: i64,
    /// Assigned agent, if any.
    pub agent_id: Option<i64>,
    /// Who opened the ticket.
    pub requester: Party,
    /// Set while the ticket is complete; `None` means open.
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Ticket {
    /// Whether the ticket has been completed.
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Ticket {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            subject: row.try_get("subject")?,
            content: row.try_get("content")?,
            html: row.try_get("html")?,
            status_id: row.try_get("status_id")?,
            priority_id: row.try_get("priority_id")?,
            category_id: row.try_get("category_id")?,
            agent_id: row.try_get("agent_id")?,
            requester: Party::from_columns(row)?,
            completed_at: row.try_get("completed_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// A comment on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub ticket_id: i64,
    pub content: String,
    pub html: Option<String>,
    pub author: Party,
    pub created_at: String,
    pub updated_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for Comment {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            ticket_id: row.try_get("ticket_id")?,
            content: row.try_get("content")?,
            html: row.try_get("html")?,
            author: Party::from_columns(row)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// A persisted configuration row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub id: i64,
    /// Unique key.
    pub slug: String,
    /// Stored value, possibly in the legacy serialized encoding.
    pub value: String,
    /// Value the row was seeded with.
    pub default_value: String,
    /// Translation key; when present it replaces `value` on read.
    pub lang: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// An audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Audit {
    pub id: i64,
    pub operation: String,
    pub user_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub ticket_id: Option<i64>,
    pub created_at: String,
}
