use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::Result;
use crate::identity;
use crate::types::Identity;

/// Maximum number of (platform, external_id) → user_id pairs kept in the
/// in-process cache. Simple eviction: when full, drop the oldest half.
const CACHE_MAX: usize = 256;

/// Result of resolving a (platform, external_id) pair.
#[derive(Debug)]
pub enum ResolvedIdentity {
    Known(Identity),
    /// Auto-created on first contact.
    NewlyCreated(Identity),
}

impl ResolvedIdentity {
    pub fn identity(&self) -> &Identity {
        match self {
            ResolvedIdentity::Known(i) => i,
            ResolvedIdentity::NewlyCreated(i) => i,
        }
    }
}

/// Translates external platform identities into first-class Identities.
/// Hot path: every inbound chat message and every point-earning event calls
/// `resolve()`, so the (platform, external_id) → user_id mapping is cached
/// in memory to avoid a DB round-trip on every call for known users.
pub struct IdentityResolver {
    db: Arc<Mutex<Connection>>,
    cache: Mutex<HashMap<(String, String), i64>>,
    cache_order: Mutex<Vec<(String, String)>>,
}

impl IdentityResolver {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self {
            db,
            cache: Mutex::new(HashMap::new()),
            cache_order: Mutex::new(Vec::new()),
        }
    }

    /// Resolve a (platform, external_id) pair to an Identity, auto-creating
    /// one on first contact, and following it through to its currently
    /// active owner if it has since been merged away.
    pub fn resolve(&self, platform: &str, external_id: &str, display_name: &str) -> Result<ResolvedIdentity> {
        let key = (platform.to_string(), external_id.to_string());

        if let Some(user_id) = self.cache_lookup(&key) {
            debug!(platform, external_id, user_id, "cache hit");
            let conn = self.db.lock().unwrap();
            let active_id = identity::resolve_active_user_id(&conn, user_id)?;
            if let Some(found) = crate::db::get_identity(&conn, active_id)? {
                if active_id != user_id {
                    drop(conn);
                    self.cache_insert(key, active_id);
                }
                return Ok(ResolvedIdentity::Known(found));
            }
            self.cache_remove(&key);
        }

        let conn = self.db.lock().unwrap();
        let (found, _profile, is_new) =
            identity::get_or_create_identity(&conn, platform, external_id, display_name, None)?;
        let active_id = identity::resolve_active_user_id(&conn, found.user_id)?;
        let resolved = if active_id == found.user_id {
            found
        } else {
            crate::db::get_identity(&conn, active_id)?
                .ok_or_else(|| crate::error::IdentityError::NotFound(active_id.to_string()))?
        };
        self.cache_insert(key, resolved.user_id);

        if is_new {
            info!(platform, external_id, user_id = resolved.user_id, "new identity created");
            Ok(ResolvedIdentity::NewlyCreated(resolved))
        } else {
            Ok(ResolvedIdentity::Known(resolved))
        }
    }

    /// Drop every cache entry pointing at `user_id`. Call after a merge or
    /// split touches that identity so stale mappings aren't served.
    pub fn invalidate_user(&self, user_id: i64) {
        let mut cache = self.cache.lock().unwrap();
        let mut order = self.cache_order.lock().unwrap();
        order.retain(|k| {
            if cache.get(k) == Some(&user_id) {
                cache.remove(k);
                false
            } else {
                true
            }
        });
    }

    fn cache_lookup(&self, key: &(String, String)) -> Option<i64> {
        self.cache.lock().unwrap().get(key).copied()
    }

    fn cache_remove(&self, key: &(String, String)) {
        let mut cache = self.cache.lock().unwrap();
        let mut order = self.cache_order.lock().unwrap();
        cache.remove(key);
        order.retain(|k| k != key);
    }

    fn cache_insert(&self, key: (String, String), user_id: i64) {
        let mut cache = self.cache.lock().unwrap();
        let mut order = self.cache_order.lock().unwrap();

        if let std::collections::hash_map::Entry::Occupied(mut e) = cache.entry(key.clone()) {
            e.insert(user_id);
            return;
        }

        if cache.len() >= CACHE_MAX {
            let evict_count = CACHE_MAX / 2;
            let to_remove: Vec<_> = order.drain(..evict_count).collect();
            for k in to_remove {
                cache.remove(&k);
            }
        }

        order.push(key.clone());
        cache.insert(key, user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = powerbot_store::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    #[test]
    fn resolve_creates_then_caches() {
        let resolver = IdentityResolver::new(setup());
        let first = resolver.resolve("discord", "d1", "Alice").unwrap();
        assert!(matches!(first, ResolvedIdentity::NewlyCreated(_)));

        let second = resolver.resolve("discord", "d1", "Alice").unwrap();
        assert!(matches!(second, ResolvedIdentity::Known(_)));
        assert_eq!(first.identity().user_id, second.identity().user_id);
    }

    #[test]
    fn resolve_follows_merge_after_cache_hit() {
        let db = setup();
        let resolver = IdentityResolver::new(db.clone());

        let discord_first = resolver.resolve("discord", "d1", "Alice").unwrap();
        let discord_id = discord_first.identity().user_id;
        let yt_first = resolver.resolve("youtube", "y1", "Alice").unwrap();
        let yt_id = yt_first.identity().user_id;

        {
            let conn = db.lock().unwrap();
            identity::merge_identities(&conn, yt_id, discord_id, "test").unwrap();
        }

        let resolved = resolver.resolve("youtube", "y1", "Alice").unwrap();
        assert_eq!(resolved.identity().user_id, discord_id);
    }
}
