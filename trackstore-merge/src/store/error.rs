use std::error::Error;

use thiserror::Error;

use crate::types::Identity;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by an [`EntityStore`](crate::store::EntityStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table `{0}` does not exist in the store")]
    UnknownTable(String),

    #[error("row {identity} does not exist in table `{table}`")]
    RowNotFound { table: String, identity: Identity },

    /// A primary key, uniqueness or foreign key constraint rejected the write.
    #[error("constraint violation on table `{table}`: {detail}")]
    ConstraintViolation { table: String, detail: String },

    /// The store could not be reached or failed while executing a statement.
    #[error("store unavailable: {0}")]
    Unavailable(#[source] Box<dyn Error + Send + Sync>),
}

impl StoreError {
    pub fn unavailable<E>(err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        StoreError::Unavailable(err.into())
    }

    pub fn constraint_violation(table: impl Into<String>, detail: impl Into<String>) -> Self {
        StoreError::ConstraintViolation {
            table: table.into(),
            detail: detail.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
