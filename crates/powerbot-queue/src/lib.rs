//! Cross-process Event Queue (§4.9): a JSON array file used when a producer
//! and a consumer live in separate worker processes and can't share an
//! in-memory channel.
//!
//! Race tolerance is kept exactly as the source designs it: concurrent
//! producers both load-append-write the same file with no lock, so the
//! last writer wins and an interleaved write can lose an event. This is
//! acceptable because queued events are advisory notifications (economy
//! progress pings to a chat bot), never the source of truth for balances —
//! the ledger itself lives behind `begin_immediate` transactions elsewhere.
//! This crate does not add a file lock to "fix" that; doing so would be a
//! silent behavior change the source never asked for.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Appends `event` to the JSON array at `path`, creating the file and its
/// parent directory if needed. Read-modify-write, not atomic across
/// concurrent producers — see the crate-level doc comment.
pub fn enqueue<T: Serialize>(path: &Path, event: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut items = read_array(path);
    let value = serde_json::to_value(event).unwrap_or(Value::Null);
    items.push(value);
    write_array(path, &items)
}

/// Pops up to `max_items` events off the head of the queue, writing the
/// remainder back (or deleting the file if nothing is left). Returns the
/// popped events in FIFO order.
pub fn pop_up_to<T: for<'de> Deserialize<'de>>(path: &Path, max_items: usize) -> Vec<T> {
    if !path.exists() {
        return Vec::new();
    }

    let mut items = read_array(path);
    if items.is_empty() {
        return Vec::new();
    }

    let split_at = max_items.min(items.len());
    let remaining = items.split_off(split_at);

    if remaining.is_empty() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(error = %e, path = %path.display(), "failed to remove drained queue file");
        }
    } else if let Err(e) = write_array(path, &remaining) {
        warn!(error = %e, path = %path.display(), "failed to write remaining queue");
    }

    items
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

fn read_array(path: &Path) -> Vec<Value> {
    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

fn write_array(path: &Path, items: &[Value]) -> std::io::Result<()> {
    let raw = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
    std::fs::write(path, raw)
}

/// One economy progress event destined for a non-Discord platform,
/// matching the cross-process payload shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalProgressEvent {
    pub platform: String,
    pub platform_user_id: String,
    pub previous_balance: f64,
    pub new_balance: f64,
}

pub fn default_queue_path(data_root: &Path) -> PathBuf {
    data_root.join("discord_bot").join("economy_external_events.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn enqueue_then_pop_preserves_fifo_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.json");

        enqueue(&path, &ExternalProgressEvent {
            platform: "youtube".into(),
            platform_user_id: "u1".into(),
            previous_balance: 5.0,
            new_balance: 15.0,
        }).unwrap();
        enqueue(&path, &ExternalProgressEvent {
            platform: "youtube".into(),
            platform_user_id: "u2".into(),
            previous_balance: 0.0,
            new_balance: 10.0,
        }).unwrap();

        let popped: Vec<ExternalProgressEvent> = pop_up_to(&path, 1);
        assert_eq!(popped.len(), 1);
        assert_eq!(popped[0].platform_user_id, "u1");
        assert!(path.exists());

        let rest: Vec<ExternalProgressEvent> = pop_up_to(&path, 100);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].platform_user_id, "u2");
        assert!(!path.exists());
    }

    #[test]
    fn pop_on_missing_file_returns_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let popped: Vec<ExternalProgressEvent> = pop_up_to(&path, 10);
        assert!(popped.is_empty());
    }
}
