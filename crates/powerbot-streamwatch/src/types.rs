use serde::{Deserialize, Serialize};

/// Single-row cache of the last-known upstream broadcast state (§3).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamState {
    pub is_live: bool,
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub last_checked: Option<String>,
    pub last_status_change: Option<String>,
}

/// Result of one `detect()` call: the refreshed state, and whether it
/// differs from what was known before the call (§4.5's transition table).
#[derive(Debug, Clone)]
pub struct DetectOutcome {
    pub state: StreamState,
    pub changed: bool,
}
