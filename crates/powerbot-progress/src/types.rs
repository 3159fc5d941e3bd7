use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Monotonically increasing milestone thresholds, checked in order so a
/// user who jumps past several at once (a large single credit) still gets
/// one notification per level instead of only the highest.
pub const MILESTONE_LEVELS: &[u64] = &[
    10, 50, 100, 200, 350, 500, 700, 1000, 1500, 2000, 3000, 4000, 5000, 6000, 7000, 8000, 9000,
    10000, 20000, 30000, 40000, 50000, 60000, 70000, 80000, 90000, 100000,
];

/// A balance at or below this is bankrupt. Not exactly zero so a balance of
/// `0.0` from a brand-new wallet (never credited) doesn't itself read as a
/// bankruptcy transition.
pub const BANKRUPTCY_THRESHOLD: f64 = 0.99;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProgress {
    pub milestones_seen: Vec<u64>,
}

/// Per-guild progress state, keyed by `"{platform}:{user_ref}"` so the same
/// file serves Discord members and linked external-platform users alike.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildProgressState {
    pub users: HashMap<String, UserProgress>,
}

/// What `notifier::update` found for one balance change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressOutcome {
    /// Milestone levels newly crossed, in ascending order.
    pub milestones_reached: Vec<u64>,
    /// Whether this update crossed from solvent into bankrupt.
    pub bankrupt: bool,
}

impl ProgressOutcome {
    pub fn is_empty(&self) -> bool {
        self.milestones_reached.is_empty() && !self.bankrupt
    }
}
