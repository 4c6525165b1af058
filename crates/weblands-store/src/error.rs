//! Store error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{entity} not found: {name}")]
    NotFound { entity: &'static str, name: String },

    #[error("cannot open store at {path}: {reason}")]
    Open { path: String, reason: String },
}

impl StoreError {
    pub fn not_found(entity: &'static str, name: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            name: name.into(),
        }
    }

    /// Whether the underlying failure is a unique/primary-key violation,
    /// i.e. a benign race two writers can both survive.
    pub fn is_integrity_conflict(&self) -> bool {
        match self {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}
