use thiserror::Error;

/// Economy Ledger error taxonomy (§4.3/§7).
#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("insufficient funds: have {available}, need {requested}")]
    InsufficientFunds { available: f64, requested: f64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("cannot transfer to the same user")]
    SelfTransfer,

    #[error("unknown user: {0}")]
    UnknownUser(i64),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("storage error: {0}")]
    Store(#[from] powerbot_store::StoreError),
}

impl EconomyError {
    pub fn code(&self) -> &'static str {
        match self {
            EconomyError::InsufficientFunds { .. } => "insufficient_funds",
            EconomyError::InvalidAmount(_) => "invalid_amount",
            EconomyError::SelfTransfer => "self_transfer",
            EconomyError::UnknownUser(_) => "unknown_user",
            EconomyError::Storage(_) => "storage",
            EconomyError::Store(_) => "storage",
        }
    }
}

pub type Result<T> = std::result::Result<T, EconomyError>;
