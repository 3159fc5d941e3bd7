use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::types::StreamState;

/// Loads the persisted `StreamState`, tolerating a missing or corrupt file
/// by falling back to the default (not-live) state rather than failing —
/// the source's `_load_state` does the same.
pub fn load(path: &Path) -> Result<StreamState> {
    if !path.exists() {
        return Ok(StreamState::default());
    }
    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str(&raw) {
        Ok(state) => Ok(state),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "stream state file is corrupt, resetting");
            Ok(StreamState::default())
        }
    }
}

pub fn save(path: &Path, state: &StreamState) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(state)?;
    std::fs::write(path, raw)?;
    Ok(())
}
