use thiserror::Error;

/// Errors that can occur within the Replication Engine (§4.4/§7).
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("local snapshot failed: {0}")]
    SnapshotFailed(String),

    #[error("remote mirror failed: {0}")]
    MirrorFailed(String),

    #[error("restore failed: {0}")]
    RestoreFailed(String),

    #[error("manifest I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("local database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl ReplicationError {
    pub fn code(&self) -> &'static str {
        match self {
            ReplicationError::SnapshotFailed(_) => "snapshot_failed",
            ReplicationError::MirrorFailed(_) => "mirror_failed",
            ReplicationError::RestoreFailed(_) => "restore_failed",
            ReplicationError::Io(_) => "io_error",
            ReplicationError::Json(_) => "manifest_error",
            ReplicationError::Database(_) => "database_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReplicationError>;
