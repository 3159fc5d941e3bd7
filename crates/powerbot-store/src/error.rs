use thiserror::Error;

/// Errors from the embedded storage layer. Every component crate wraps
/// these into its own error enum via `#[from]` rather than re-exposing
/// `rusqlite::Error` directly, so callers only ever match on one taxonomy.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("data directory is not writable: {0}")]
    NotWritable(String),

    #[error("a write transaction is already held: {0}")]
    StorageBusy(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
