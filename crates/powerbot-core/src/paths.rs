use std::path::{Path, PathBuf};

use crate::error::Result;

/// Resolves `POWERBOT_DATA_DIR` (default `./data`) into the persisted state
/// layout from the external-interfaces section. One accessor per path;
/// each creates its parent directory on first access so callers never have
/// to `mkdir -p` by hand.
#[derive(Debug, Clone)]
pub struct DataRoot {
    root: PathBuf,
}

impl DataRoot {
    pub fn resolve() -> Self {
        let root = std::env::var("POWERBOT_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        Self {
            root: PathBuf::from(root),
        }
    }

    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("powerbot.db")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("backup")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.backup_dir().join("snapshots")
    }

    pub fn web_dir(&self) -> PathBuf {
        self.root.join("web")
    }

    pub fn events_websocket_dir(&self) -> PathBuf {
        self.root.join("events_websocket")
    }

    pub fn youtube_bot_dir(&self) -> PathBuf {
        self.root.join("youtube_bot")
    }

    pub fn discord_bot_dir(&self) -> PathBuf {
        self.root.join("discord_bot")
    }

    pub fn activities_dir(&self) -> PathBuf {
        self.root.join("activities")
    }

    pub fn bot_config_path(&self) -> PathBuf {
        self.root.join("bot_config.json")
    }

    pub fn supervisor_state_path(&self) -> PathBuf {
        self.root.join("supervisor_state.json")
    }

    /// Ensures `dir` and all its ancestors exist, returning `dir` unchanged.
    pub fn ensure(dir: &Path) -> Result<&Path> {
        std::fs::create_dir_all(dir)?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_documented_paths() {
        let root = DataRoot::from_path("/tmp/powerbot-test-root");
        assert!(root.db_path().ends_with("powerbot.db"));
        assert!(root.snapshots_dir().ends_with("backup/snapshots"));
        assert!(root.discord_bot_dir().ends_with("discord_bot"));
    }
}
