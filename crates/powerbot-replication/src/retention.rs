use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::types::ManifestEntry;

const KEEP_RECENT: usize = 5;
const KEEP_DAYS: usize = 10;

fn parse_created_at(entry: &ManifestEntry) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&entry.created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::MIN_UTC)
}

/// Applies the retention policy in place: keep the `KEEP_RECENT` newest
/// snapshots unconditionally, plus the newest snapshot for each of the next
/// `KEEP_DAYS` distinct UTC calendar days; delete the backing file for
/// everything else. Returns the surviving entries, newest first.
pub fn apply(backups: Vec<ManifestEntry>) -> Vec<ManifestEntry> {
    let mut sorted = backups;
    sorted.sort_by(|a, b| parse_created_at(b).cmp(&parse_created_at(a)));

    let recent_keep = &sorted[..sorted.len().min(KEEP_RECENT)];
    let remaining = if sorted.len() > KEEP_RECENT {
        &sorted[KEEP_RECENT..]
    } else {
        &[]
    };

    let mut older_by_day: HashMap<String, &ManifestEntry> = HashMap::new();
    let mut day_order: Vec<String> = Vec::new();
    for entry in remaining {
        let day_key = parse_created_at(entry).date_naive().to_string();
        if !older_by_day.contains_key(&day_key) {
            day_order.push(day_key.clone());
            older_by_day.insert(day_key, entry);
        }
    }
    let older_keep: Vec<&ManifestEntry> = day_order
        .iter()
        .take(KEEP_DAYS)
        .filter_map(|k| older_by_day.get(k).copied())
        .collect();

    let keep_ids: std::collections::HashSet<u64> = recent_keep
        .iter()
        .map(|e| e.id)
        .chain(older_keep.iter().map(|e| e.id))
        .collect();

    for entry in &sorted {
        if keep_ids.contains(&entry.id) {
            continue;
        }
        let path = Path::new(&entry.snapshot_path);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "failed to delete retired snapshot file");
            }
        }
    }

    sorted.retain(|e| keep_ids.contains(&e.id));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn entry(id: u64, created_at: &str) -> ManifestEntry {
        ManifestEntry {
            id,
            created_at: created_at.to_string(),
            reason: "manual".to_string(),
            snapshot_path: format!("/tmp/nonexistent_{id}.db"),
            mirror_ok: true,
            mirror_message: String::new(),
            cleanup_ok: true,
            cleanup_message: String::new(),
            table_row_counts: Map::new(),
        }
    }

    #[test]
    fn keeps_five_most_recent_unconditionally() {
        let backups: Vec<ManifestEntry> = (1..=5)
            .map(|i| entry(i, &format!("2026-07-{:02}T00:00:00+00:00", i)))
            .collect();
        let kept = apply(backups);
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn collapses_older_entries_to_one_per_day() {
        let mut backups: Vec<ManifestEntry> = (1..=5)
            .map(|i| entry(i, &format!("2026-07-20T{:02}:00:00+00:00", i)))
            .collect();
        backups.push(entry(10, "2026-07-01T10:00:00+00:00"));
        backups.push(entry(11, "2026-07-01T20:00:00+00:00"));
        backups.push(entry(12, "2026-07-02T10:00:00+00:00"));

        let kept = apply(backups);
        let ids: Vec<u64> = kept.iter().map(|e| e.id).collect();
        assert!(ids.contains(&11), "newest of the day should survive: {ids:?}");
        assert!(!ids.contains(&10), "older same-day entry should be dropped: {ids:?}");
        assert!(ids.contains(&12));
    }
}
