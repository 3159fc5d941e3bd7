use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One row of the manifest's `backups` array (§3 SnapshotManifest entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: u64,
    pub created_at: String,
    pub reason: String,
    pub snapshot_path: String,
    pub mirror_ok: bool,
    pub mirror_message: String,
    pub cleanup_ok: bool,
    pub cleanup_message: String,
    pub table_row_counts: HashMap<String, i64>,
}

/// The manifest file's top-level shape, `{"backups": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub backups: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn next_id(&self) -> u64 {
        self.backups.iter().map(|b| b.id).max().unwrap_or(0) + 1
    }
}

/// Outcome of one local-table → remote-table mirror pass.
#[derive(Debug, Clone)]
pub struct MirrorOutcome {
    pub ok: bool,
    pub message: String,
    pub table_row_counts: HashMap<String, i64>,
}
