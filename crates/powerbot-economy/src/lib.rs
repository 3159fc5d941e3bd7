//! Economy Ledger: platform wallets, the combined total wallet, cooldown-
//! gated message earning, balance deltas, transfers, and the leaderboard
//! (§4.3).

pub mod db;
pub mod error;
pub mod ledger;
pub mod types;

pub use error::{EconomyError, Result};
pub use ledger::{
    apply_balance_delta, award_message_points, get_platform_balances, get_total_balance,
    top_leaderboard, transfer,
};
pub use types::{AwardOutcome, EarningCooldown, EarningEvent, InventoryItem, LeaderboardEntry, LedgerEntry, PlatformWallet, TransferOutcome, Wallet};
