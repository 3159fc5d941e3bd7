use std::path::{Path, PathBuf};

use tracing::warn;

use crate::types::GuildProgressState;

pub fn load(path: &Path) -> GuildProgressState {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, path = %path.display(), "progress state file corrupt, starting fresh");
            GuildProgressState::default()
        }),
        Err(_) => GuildProgressState::default(),
    }
}

pub fn save(path: &Path, state: &GuildProgressState) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(state).unwrap_or_else(|_| "{}".to_string());
    std::fs::write(path, raw)
}

pub fn guild_state_path(data_root: &Path, guild_id: u64) -> PathBuf {
    data_root
        .join("discord_bot")
        .join(format!("guild_{guild_id}_economy_events.json"))
}
