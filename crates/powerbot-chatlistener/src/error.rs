use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatListenerError {
    #[error("platform client error: {0}")]
    Client(#[from] powerbot_core::PlatformClientError),
}

impl ChatListenerError {
    pub fn code(&self) -> &'static str {
        match self {
            ChatListenerError::Client(_) => "client_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatListenerError>;
