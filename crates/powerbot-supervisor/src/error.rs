use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("unknown worker kind: {0}")]
    UnknownWorker(String),

    #[error("worker {0} is already running")]
    AlreadyRunning(String),

    #[error("worker {0} is not running")]
    NotRunning(String),

    #[error("failed to spawn worker {kind}: {reason}")]
    SpawnFailed { kind: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SupervisorError {
    pub fn code(&self) -> &'static str {
        match self {
            SupervisorError::UnknownWorker(_) => "unknown_worker",
            SupervisorError::AlreadyRunning(_) => "already_running",
            SupervisorError::NotRunning(_) => "not_running",
            SupervisorError::SpawnFailed { .. } => "spawn_failed",
            SupervisorError::Io(_) => "io_error",
            SupervisorError::Json(_) => "json_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
