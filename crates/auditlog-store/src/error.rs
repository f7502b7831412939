//! Error types for the audit event store.

/// Errors that can occur during event store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database operation failed.
    #[error("event store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The event is missing a required field.
    #[error("invalid audit event: {0}")]
    InvalidEvent(String),

    /// Links or params could not be encoded, or a stored row holds bad JSON.
    #[error("audit event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored timestamp could not be parsed.
    #[error("invalid stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}
