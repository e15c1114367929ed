//! Storage error types.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g., "form").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A form with this id is already stored.
    #[error("form already exists: {id}")]
    AlreadyExists { id: String },

    /// The store file is locked by another process.
    #[error("store locked: {0}")]
    Locked(String),

    /// Reading or writing the store file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored line could not be decoded.
    #[error("JSON error at line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },

    /// JSON serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the storage crate.
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Creates a [`StorageError::NotFound`] for a form id.
    pub fn form_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "form".to_string(),
            id: id.into(),
        }
    }

    /// Returns `true` if this is a [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
