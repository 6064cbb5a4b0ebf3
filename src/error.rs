use std::path::PathBuf;
use thiserror::Error;

/// A rejected field at the ingestion boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by the store, the entry boundary and export
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("storage error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt expense row {id}: {message}")]
    CorruptRow { id: i64, message: String },

    #[error("invalid expense: {0}")]
    Validation(#[from] ValidationError),

    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    /// Storage unavailable, write failed, or unreadable stored data
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            TrackerError::Persistence(_)
                | TrackerError::StorageUnavailable { .. }
                | TrackerError::CorruptRow { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, TrackerError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
