//! Progress Notifier (§4.10): milestone and bankruptcy detection for
//! economy balance updates, with per-guild dedupe state persisted as JSON.
//! Notifications are advisory — losing one never corrupts a balance, since
//! the ledger of record lives in `powerbot-economy`.

pub mod notifier;
pub mod store;
pub mod types;

pub use notifier::update;
pub use types::{GuildProgressState, ProgressOutcome, UserProgress, BANKRUPTCY_THRESHOLD, MILESTONE_LEVELS};
