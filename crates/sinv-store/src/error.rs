//! Error types for the persistence layer.

use sinv_core::StoreError;
use thiserror::Error;

/// Errors that can occur while talking to the database.
#[derive(Error, Debug)]
pub enum DbError {
    /// Query, connection, or transaction failure.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A stored column could not be decoded into its domain type.
    #[error("failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    /// A stored template mapping is not valid JSON for its file type.
    #[error("invalid template mapping: {0}")]
    Template(#[from] serde_json::Error),

    /// The invoice row does not exist.
    #[error("invoice {0} not found")]
    InvoiceNotFound(i64),
}

impl DbError {
    pub(crate) fn decode(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::InvoiceNotFound(id) => StoreError::InvoiceNotFound(id),
            DbError::Decode { what, reason } => StoreError::Decode { what, reason },
            other => StoreError::backend(other),
        }
    }
}
