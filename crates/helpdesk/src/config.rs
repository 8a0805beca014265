//! Workflow configuration resolved from persisted settings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which roles a close/reopen permission grants.
///
/// Stored as a map such as `{owner: "yes", agent: "yes", admin: "no"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    /// The ticket's requester.
    pub owner: bool,
    /// The ticket's assigned agent.
    pub agent: bool,
    /// Any admin.
    pub admin: bool,
}

impl RolePermissions {
    /// Every role allowed.
    pub const ALL: Self = Self {
        owner: true,
        agent: true,
        admin: true,
    };

    /// Parse a stored permission map. Missing or unreadable entries deny.
    pub fn from_value(value: &Value) -> Self {
        let flag = |role: &str| value.get(role).and_then(as_flag).unwrap_or(false);
        Self {
            owner: flag("owner"),
            agent: flag("agent"),
            admin: flag("admin"),
        }
    }

    /// Encode as a stored permission map.
    pub fn to_value(&self) -> Value {
        let word = |b: bool| if b { "yes" } else { "no" };
        serde_json::json!({
            "owner": word(self.owner),
            "agent": word(self.agent),
            "admin": word(self.admin),
        })
    }
}

/// Settings the workflow consults, resolved once per operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    /// Status given to new tickets.
    pub default_status_id: i64,
    /// Status set on close, if configured.
    pub default_close_status_id: Option<i64>,
    /// Status set on reopen, if configured.
    pub default_reopen_status_id: Option<i64>,
    pub close_ticket_perm: RolePermissions,
    pub reopen_ticket_perm: RolePermissions,
    /// Hand notices to the mailer's deferred path.
    pub queue_emails: bool,
    pub status_notification: bool,
    pub comment_notification: bool,
    pub assigned_notification: bool,
    /// Page size for ticket listings.
    pub paginate_items: i64,
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            default_status_id: 1,
            default_close_status_id: None,
            default_reopen_status_id: None,
            close_ticket_perm: RolePermissions::ALL,
            reopen_ticket_perm: RolePermissions::ALL,
            queue_emails: false,
            status_notification: true,
            comment_notification: true,
            assigned_notification: true,
            paginate_items: 10,
        }
    }
}

/// Read a yes/no style flag: `true`/`false`, `1`/`0`, `"yes"`/`"no"`,
/// `"1"`/`"0"`, `"true"`/`"false"`.
pub(crate) fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "1" | "true" | "on" => Some(true),
            "no" | "0" | "false" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read an integer stored either as a number or as digits.
pub(crate) fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a status id where `0` means "not configured".
pub(crate) fn as_optional_id(value: &Value) -> Option<i64> {
    as_int(value).filter(|id| *id > 0)
}
