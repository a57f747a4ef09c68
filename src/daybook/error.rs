use thiserror::Error;

use crate::model::EntryDate;

#[derive(Error, Debug)]
pub enum DaybookError {
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryDate),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Remote rejected {path} (status {status}); check credentials and repository")]
    Authorization { status: u16, path: String },

    #[error("Version conflict writing {path}; the remote copy has changed")]
    Conflict { path: String },

    #[error("Remote operation failed after {attempts} attempts: {source}")]
    Transient {
        attempts: u32,
        #[source]
        source: Box<DaybookError>,
    },

    #[error("Remote returned unexpected status {status} for {path}")]
    RemoteStatus { status: u16, path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl DaybookError {
    /// True for the version-token mismatch case, which callers must never
    /// blindly retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DaybookError::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, DaybookError>;
