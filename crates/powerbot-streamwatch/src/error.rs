use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamWatchError {
    #[error("state I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StreamWatchError {
    pub fn code(&self) -> &'static str {
        match self {
            StreamWatchError::Io(_) => "io_error",
            StreamWatchError::Json(_) => "json_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamWatchError>;
