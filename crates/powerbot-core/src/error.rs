use thiserror::Error;

/// Errors raised by config loading and data-root path resolution. Every
/// other component crate defines its own scoped error enum (§7); this one
/// only covers the bootstrap concerns that `powerbot-core` itself owns.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "config_error",
            CoreError::Io(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
