//! Error types for helpdesk operations.
//!
//! Authorization denials and missing records are not errors; they travel as
//! [`Outcome`](crate::Outcome) values.

use helpdesk_db::{DatabaseError, ValidationError};
use thiserror::Error;

/// Errors that can occur during helpdesk operations.
#[derive(Debug, Error)]
pub enum HelpdeskError {
    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A request carried both a customer and a staff session.
    #[error("both customer and staff sessions are active")]
    AmbiguousPrincipal,

    /// A reference-data row cannot be removed while tickets use it.
    #[error("{entity} is still in use: {id}")]
    InUse { entity: &'static str, id: String },

    /// The store failed.
    #[error("database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for HelpdeskError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::InUse { entity, id } => HelpdeskError::InUse { entity, id },
            other => HelpdeskError::Database(other),
        }
    }
}

/// Result type for helpdesk operations.
pub type Result<T> = std::result::Result<T, HelpdeskError>;
