use thiserror::Error;

/// Identity & Link Registry error taxonomy (§7).
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity not found: {0}")]
    NotFound(String),

    #[error("identity already exists: {0}")]
    AlreadyExists(String),

    #[error("link code is invalid or already consumed")]
    CodeInvalid,

    #[error("link code has expired")]
    CodeExpired,

    #[error("platform profile is already linked to another identity")]
    AlreadyLinked,

    #[error("platform profile is not linked to any identity")]
    NotLinked,

    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("storage error: {0}")]
    Store(#[from] powerbot_store::StoreError),
}

impl IdentityError {
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::NotFound(_) => "not_found",
            IdentityError::AlreadyExists(_) => "already_exists",
            IdentityError::CodeInvalid => "code_invalid",
            IdentityError::CodeExpired => "code_expired",
            IdentityError::AlreadyLinked => "link_conflict",
            IdentityError::NotLinked => "not_linked",
            IdentityError::DatabaseError(_) => "storage",
            IdentityError::Store(_) => "storage",
        }
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
