use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::types::Manifest;

/// Loads `autosave_manifest.json`, tolerating a missing or corrupt file by
/// returning an empty manifest — the source does the same rather than
/// failing the whole worker over a damaged manifest.
pub fn load(path: &Path) -> Result<Manifest> {
    if !path.exists() {
        return Ok(Manifest::default());
    }
    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str(&raw) {
        Ok(manifest) => Ok(manifest),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "manifest JSON is corrupt, starting fresh");
            Ok(Manifest::default())
        }
    }
}

pub fn save(path: &Path, manifest: &Manifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, raw)?;
    Ok(())
}
