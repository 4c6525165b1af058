//! Orchestrator-level error taxonomy.
//!
//! Inside processors and the fetch ladder no error escapes; what reaches
//! the caller is limited to validation problems, missing aggregates and
//! fatal setup conditions.

use thiserror::Error;
use weblands_fetch::FetchError;
use weblands_store::StoreError;
use weblands_types::ExportError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("land \"{name}\" not found")]
    LandNotFound { name: String },

    #[error("{message}")]
    Validation { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }
}
