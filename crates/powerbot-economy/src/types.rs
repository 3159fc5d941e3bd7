use serde::{Deserialize, Serialize};

/// The authoritative, always-recomputed total across every PlatformWallet
/// a user owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: i64,
    pub balance: f64,
    pub updated_at: String,
}

/// A per-platform balance. Sums to `Wallet.balance` (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformWallet {
    pub user_id: i64,
    pub platform: String,
    pub balance: f64,
    pub updated_at: String,
}

/// An append-only record of every balance-affecting event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub reason: String,
    pub platform: Option<String>,
    pub scope_id: Option<String>,
    pub source_id: Option<String>,
    pub created_at: String,
}

/// One (user, scope) pair's last award time, gating `award_message_points`
/// idempotency. `scope_id` is the generic stand-in for a Discord guild id
/// or a YouTube live chat id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningCooldown {
    pub user_id: i64,
    pub scope_id: String,
    pub last_awarded_at: String,
}

/// A single, never-repeated (platform, source_id) award, used to make
/// `award_message_points` idempotent against redelivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningEvent {
    pub platform: String,
    pub source_id: String,
    pub user_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub user_id: i64,
    pub item_id: String,
    pub quantity: i64,
    pub updated_at: String,
}

/// Outcome of `award_message_points`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardOutcome {
    pub awarded: bool,
    pub points_added: f64,
    pub new_total: Option<f64>,
}

/// Outcome of `transfer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub from_total: f64,
    pub to_total: f64,
}

/// One row of `top_leaderboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub balance: f64,
}
