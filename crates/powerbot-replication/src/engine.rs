use std::path::PathBuf;

use chrono::Utc;
use powerbot_core::{config::BackupConfig, paths::DataRoot};
use sqlx::MySqlPool;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{ReplicationError, Result};
use crate::manifest;
use crate::retention;
use crate::snapshot;
use crate::types::ManifestEntry;

fn ts_for_file(now: chrono::DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Drives snapshot + mirror + retention on a schedule, and answers manual
/// `create_autosave`/`recover` calls from the console.
pub struct ReplicationEngine {
    db_path: PathBuf,
    snapshots_dir: PathBuf,
    manifest_path: PathBuf,
    cfg: BackupConfig,
    pool: MySqlPool,
}

impl ReplicationEngine {
    pub async fn new(root: &DataRoot, cfg: BackupConfig) -> Result<Self> {
        let pool = snapshot::connect_remote(&cfg).await?;
        Ok(Self {
            db_path: root.db_path(),
            snapshots_dir: root.snapshots_dir(),
            manifest_path: root.backup_dir().join("autosave_manifest.json"),
            cfg,
            pool,
        })
    }

    pub fn list_backups(&self) -> Result<Vec<ManifestEntry>> {
        let manifest = manifest::load(&self.manifest_path)?;
        let mut backups = manifest.backups;
        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Runs snapshot + mirror + retention once, recording a manifest entry
    /// tagged with `reason`. The local file copy is a hard prerequisite; the
    /// mirror step is best-effort and its failure is recorded, not raised.
    pub async fn create_autosave(&self, reason: &str) -> Result<ManifestEntry> {
        if !self.db_path.exists() {
            return Err(ReplicationError::SnapshotFailed(format!(
                "local database does not exist: {}",
                self.db_path.display()
            )));
        }

        let conn = powerbot_store::open(&self.db_path).map_err(|e| ReplicationError::SnapshotFailed(e.to_string()))?;

        let (cleanup_ok, cleanup_message) = match snapshot::cleanup_orphan_tables(&conn, &self.pool).await {
            Ok(result) => result,
            Err(e) => (false, e.to_string()),
        };

        let now = Utc::now();
        let snapshot_path = snapshot::create_snapshot_file(&self.db_path, &self.snapshots_dir, &ts_for_file(now))?;
        let tag = snapshot_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| tag_fallback(now));

        let mirror_outcome = snapshot::mirror_to_remote(&conn, &self.pool, &tag).await;
        let (mirror_ok, mirror_message, table_row_counts) = match mirror_outcome {
            Ok(outcome) => (outcome.ok, outcome.message, outcome.table_row_counts),
            Err(e) => {
                warn!(error = %e, "mirror step failed, manifest entry recorded with mirror_ok=false");
                (false, e.to_string(), Default::default())
            }
        };

        let mut manifest = manifest::load(&self.manifest_path)?;
        let entry = ManifestEntry {
            id: manifest.next_id(),
            created_at: powerbot_core::now_rfc3339(),
            reason: reason.to_string(),
            snapshot_path: snapshot_path.to_string_lossy().to_string(),
            mirror_ok,
            mirror_message,
            cleanup_ok,
            cleanup_message,
            table_row_counts,
        };
        manifest.backups.push(entry.clone());
        manifest.backups = retention::apply(manifest.backups);
        manifest::save(&self.manifest_path, &manifest)?;

        info!(reason, mirror_ok, "autosave completed");
        Ok(entry)
    }

    /// Restores the snapshot at `index_1_based` (as returned by
    /// `list_backups`, newest first) over the local DB, then re-mirrors
    /// tagged `recovery_<timestamp>`.
    pub async fn recover(&self, index_1_based: usize) -> Result<ManifestEntry> {
        let backups = self.list_backups()?;
        if index_1_based == 0 || index_1_based > backups.len() {
            return Err(ReplicationError::RestoreFailed("index out of range".to_string()));
        }
        let target = &backups[index_1_based - 1];
        let source = PathBuf::from(&target.snapshot_path);
        if !source.exists() {
            return Err(ReplicationError::RestoreFailed(format!(
                "snapshot file missing: {}",
                source.display()
            )));
        }

        std::fs::copy(&source, &self.db_path)
            .map_err(|e| ReplicationError::RestoreFailed(e.to_string()))?;

        let reason = format!("recovery_{}", ts_for_file(Utc::now()));
        self.create_autosave(&reason).await
    }

    /// Deletes the manifest entry and backing file for `index_1_based`.
    pub fn delete_backup(&self, index_1_based: usize) -> Result<()> {
        let backups = self.list_backups()?;
        if index_1_based == 0 || index_1_based > backups.len() {
            return Err(ReplicationError::RestoreFailed("index out of range".to_string()));
        }
        let target_id = backups[index_1_based - 1].id;
        let target_path = PathBuf::from(&backups[index_1_based - 1].snapshot_path);

        let mut manifest = manifest::load(&self.manifest_path)?;
        manifest.backups.retain(|b| b.id != target_id);
        manifest::save(&self.manifest_path, &manifest)?;

        if target_path.exists() {
            let _ = std::fs::remove_file(&target_path);
        }
        Ok(())
    }

    /// Two independent loops until `shutdown` fires: a fast interval-check
    /// that runs a full autosave once `poll_seconds` has elapsed since the
    /// last run, and a slower `SELECT 1` health ping against the mirror.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("replication engine started");

        let mut last_run: Option<chrono::DateTime<Utc>> = None;
        let mut autosave_tick = tokio::time::interval(std::time::Duration::from_secs(5));
        let mut health_tick =
            tokio::time::interval(std::time::Duration::from_secs(self.cfg.healthcheck_seconds));

        loop {
            tokio::select! {
                _ = autosave_tick.tick() => {
                    let due = last_run
                        .map(|t| (Utc::now() - t).num_seconds() >= self.cfg.poll_seconds as i64)
                        .unwrap_or(true);
                    if due {
                        match self.create_autosave("scheduler").await {
                            Ok(entry) => {
                                last_run = Some(Utc::now());
                                info!(id = entry.id, "scheduled autosave completed");
                            }
                            Err(e) => error!(error = %e, "scheduled autosave failed"),
                        }
                    }
                }
                _ = health_tick.tick() => {
                    if let Err(e) = snapshot::health_ping(&self.pool).await {
                        if self.cfg.healthcheck_verbose {
                            warn!(error = %e, "remote health check failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("replication engine shutting down");
                        break;
                    }
                }
            }
        }
    }
}

fn tag_fallback(now: chrono::DateTime<Utc>) -> String {
    format!("autosave_{}", ts_for_file(now))
}
