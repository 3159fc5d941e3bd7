//! Persisted `enabled`/`autorun` flags for each worker, stored as one JSON
//! file. The Python original kept a separate small JSON file per flag per
//! worker; here both flags for every worker live in a single `PersistedState`
//! document, which is simpler to load/save atomically and documented as a
//! deliberate generalization rather than a hidden behavior change.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::types::WorkerKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    pub enabled: HashMap<String, bool>,
    pub autorun: HashMap<String, bool>,
}

impl PersistedState {
    pub fn is_enabled(&self, kind: WorkerKind) -> bool {
        self.enabled.get(kind.label()).copied().unwrap_or(false)
    }

    pub fn is_autorun(&self, kind: WorkerKind) -> bool {
        self.autorun.get(kind.label()).copied().unwrap_or(false)
    }

    pub fn set_enabled(&mut self, kind: WorkerKind, value: bool) {
        self.enabled.insert(kind.label().to_string(), value);
    }

    pub fn set_autorun(&mut self, kind: WorkerKind, value: bool) {
        self.autorun.insert(kind.label().to_string(), value);
    }
}

pub fn load(path: &Path) -> Result<PersistedState> {
    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "supervisor state file corrupt, starting fresh");
                Ok(PersistedState::default())
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersistedState::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn save(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(state)?;
    std::fs::write(path, raw)?;
    Ok(())
}
