//! Results of guarded operations.

use serde::Serialize;

/// Why an operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    /// No one is signed in.
    Unauthenticated,
    /// The principal may not see this ticket.
    View,
    /// The principal may not comment on this ticket.
    Comment,
    /// The principal may not edit this comment.
    EditComment,
    /// The principal may not delete this comment.
    DeleteComment,
    /// The close permission map excludes the principal.
    Close,
    /// The reopen permission map excludes the principal.
    Reopen,
    /// Only agents and admins may update tickets.
    Update,
    /// Only admins may delete tickets.
    Delete,
    /// Only admins may manage reference data and settings.
    Manage,
}

impl Denial {
    pub fn as_str(&self) -> &'static str {
        match self {
            Denial::Unauthenticated => "unauthenticated",
            Denial::View => "view",
            Denial::Comment => "comment",
            Denial::EditComment => "edit_comment",
            Denial::DeleteComment => "delete_comment",
            Denial::Close => "close",
            Denial::Reopen => "reopen",
            Denial::Update => "update",
            Denial::Delete => "delete",
            Denial::Manage => "manage",
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "not permitted: {}", self.as_str())
    }
}

/// What a guarded operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation ran.
    Done(T),
    /// The principal was not allowed to run it.
    Denied(Denial),
    /// A referenced record does not exist.
    NotFound { entity: &'static str, id: String },
}

impl<T> Outcome<T> {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Outcome::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Outcome::Denied(_))
    }

    /// Transform the payload of a completed operation.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Denied(denial) => Outcome::Denied(denial),
            Outcome::NotFound { entity, id } => Outcome::NotFound { entity, id },
        }
    }

    /// The payload, if the operation ran.
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            _ => None,
        }
    }
}
