use rusqlite::{params, Connection};

use crate::db;
use crate::error::{IdentityError, Result};
use crate::types::{Identity, MergeResult, PlatformProfile, UnlinkResult};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 8;
const CODE_MAX_RETRIES: usize = 5;
const LINK_CODE_TTL_MINUTES: i64 = 10;

fn pseudo_random_byte(salt: usize) -> u8 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as usize;
    (nanos.wrapping_add(salt.wrapping_mul(2654435761)) % 256) as u8
}

fn generate_code() -> String {
    (0..CODE_LEN)
        .map(|i| {
            let idx = pseudo_random_byte(i) as usize % CODE_ALPHABET.len();
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Atomically creates an Identity + PlatformProfile if the (platform,
/// external_id) pair has never been seen, otherwise returns the existing
/// pair untouched. Never leaves an orphan Identity with no profile, and
/// never leaves a profile without its Identity (§4.2).
pub fn get_or_create_identity(
    conn: &Connection,
    platform: &str,
    external_id: &str,
    display_name: &str,
    avatar_url: Option<&str>,
) -> Result<(Identity, PlatformProfile, bool)> {
    if let Some(profile) = db::get_profile(conn, platform, external_id)? {
        let identity = db::get_identity(conn, profile.user_id)?
            .ok_or_else(|| IdentityError::NotFound(profile.user_id.to_string()))?;
        return Ok((identity, profile, false));
    }

    let identity = db::insert_identity(conn, display_name)?;
    let profile = db::insert_profile(
        conn,
        platform,
        external_id,
        identity.user_id,
        display_name,
        avatar_url,
    )?;
    Ok((identity, profile, true))
}

/// Issues a fresh link code for a Discord identity, replacing any
/// still-active code for the same id (§4.2).
pub fn create_link_code(
    conn: &Connection,
    discord_external_id: &str,
    discord_display_name: &str,
) -> Result<(String, String)> {
    let (identity, _profile, _is_new) = get_or_create_identity(
        conn,
        "discord",
        discord_external_id,
        discord_display_name,
        None,
    )?;

    db::replace_active_tokens_for_discord_id(conn, discord_external_id)?;

    let expires_at =
        (chrono::Utc::now() + chrono::Duration::minutes(LINK_CODE_TTL_MINUTES)).to_rfc3339();

    let mut attempt = 0;
    loop {
        let code = generate_code();
        if !db::code_exists(conn, &code)? {
            db::insert_link_token(conn, &code, discord_external_id, identity.user_id, &expires_at)?;
            return Ok((code, expires_at));
        }
        attempt += 1;
        if attempt >= CODE_MAX_RETRIES {
            return Err(IdentityError::AlreadyExists(
                "could not allocate a unique link code".to_string(),
            ));
        }
    }
}

/// Consumes a link code, merging the YouTube-owning identity into the
/// Discord-owning identity when they differ (§4.2 algorithm). Runs as one
/// `begin_immediate` transaction (§4.1/§5) so a concurrent consume of the
/// same code, or a concurrent merge touching either identity, can't
/// interleave with this one.
pub fn consume_link_code(
    conn: &mut Connection,
    code: &str,
    youtube_external_id: &str,
    youtube_display_name: &str,
    avatar_url: Option<&str>,
) -> Result<MergeResult> {
    powerbot_store::begin_immediate(conn, |tx| {
        let token = db::get_link_token(tx, code)?.ok_or(IdentityError::CodeInvalid)?;
        if token.status != crate::types::LinkTokenStatus::Active {
            return Err(IdentityError::CodeInvalid);
        }
        if token.expires_at < powerbot_core::now_rfc3339() {
            return Err(IdentityError::CodeExpired);
        }

        let (_yt_identity, yt_profile, _is_new) = get_or_create_identity(
            tx,
            "youtube",
            youtube_external_id,
            youtube_display_name,
            avatar_url,
        )?;

        let destination = token.owner_user_id;
        let merged_from = if yt_profile.user_id != destination {
            merge_identities(tx, yt_profile.user_id, destination, "link_code")?;
            Some(yt_profile.user_id)
        } else {
            None
        };

        db::reassign_profile_owner(tx, "youtube", youtube_external_id, destination)?;

        let audit_id = format!("discord:{}:{}", destination, token.discord_external_id);
        db::insert_linked_account_audit(tx, &audit_id, destination, "discord", &token.discord_external_id)?;
        let audit_id_yt = format!("youtube:{}:{}", destination, youtube_external_id);
        db::insert_linked_account_audit(tx, &audit_id_yt, destination, "youtube", youtube_external_id)?;

        db::mark_token_consumed(tx, code, youtube_external_id)?;

        Ok(MergeResult {
            primary_user_id: destination,
            merged_from,
        })
    })
}

/// Moves `source`'s ledger/cooldown/inventory rows to `destination`, sums
/// platform wallets, zeros `source`'s totals, and writes the IdLinkMap
/// row. Operates directly on the economy tables because Identity and
/// Economy share one embedded database; the Rust API boundary between the
/// two components stays at the crate surface, not the SQL layer.
///
/// Takes `&Connection` rather than opening its own transaction: every
/// caller already runs inside a `begin_immediate` block (`consume_link_code`,
/// `force_link_discord_to_identity`), since this touches both identities'
/// rows across several tables and must not interleave with a concurrent
/// merge or economy write touching either side.
pub(crate) fn merge_identities(
    conn: &Connection,
    source: i64,
    destination: i64,
    reason: &str,
) -> Result<()> {
    if source == destination {
        return Ok(());
    }

    conn.execute(
        "UPDATE ledger SET user_id = ?2 WHERE user_id = ?1",
        params![source, destination],
    )?;

    conn.execute(
        "UPDATE earning_events SET user_id = ?2 WHERE user_id = ?1",
        params![source, destination],
    )?;

    conn.execute(
        "UPDATE earning_cooldowns SET user_id = ?2 WHERE user_id = ?1
         AND scope_id NOT IN (SELECT scope_id FROM earning_cooldowns WHERE user_id = ?2)",
        params![source, destination],
    )?;
    conn.execute(
        "UPDATE earning_cooldowns SET last_awarded_at = (
             SELECT MAX(a.last_awarded_at, b.last_awarded_at)
             FROM earning_cooldowns a, earning_cooldowns b
             WHERE a.user_id = ?1 AND a.scope_id = earning_cooldowns.scope_id
               AND b.user_id = ?2 AND b.scope_id = earning_cooldowns.scope_id
         )
         WHERE user_id = ?2 AND scope_id IN (SELECT scope_id FROM earning_cooldowns WHERE user_id = ?1)",
        params![source, destination],
    )?;
    conn.execute("DELETE FROM earning_cooldowns WHERE user_id = ?1", params![source])?;

    conn.execute(
        "UPDATE inventory_items SET quantity = quantity + (
             SELECT quantity FROM inventory_items WHERE user_id = ?1 AND item_id = inventory_items.item_id
         )
         WHERE user_id = ?2 AND item_id IN (SELECT item_id FROM inventory_items WHERE user_id = ?1)",
        params![source, destination],
    )?;
    conn.execute(
        "UPDATE inventory_items SET user_id = ?2 WHERE user_id = ?1
         AND item_id NOT IN (SELECT item_id FROM inventory_items WHERE user_id = ?2)",
        params![source, destination],
    )?;
    conn.execute("DELETE FROM inventory_items WHERE user_id = ?1", params![source])?;

    conn.execute(
        "INSERT INTO platform_wallets (user_id, platform, balance, updated_at)
         SELECT ?2, platform, balance, ?3 FROM platform_wallets WHERE user_id = ?1
         ON CONFLICT(user_id, platform) DO UPDATE SET
            balance = round(platform_wallets.balance + excluded.balance, 2),
            updated_at = excluded.updated_at",
        params![source, destination, powerbot_core::now_rfc3339()],
    )?;
    conn.execute(
        "UPDATE platform_wallets SET balance = 0, updated_at = ?2 WHERE user_id = ?1",
        params![source, powerbot_core::now_rfc3339()],
    )?;

    recompute_wallet(conn, destination)?;
    recompute_wallet(conn, source)?;

    db::insert_id_link_map(conn, source, destination, reason)?;
    Ok(())
}

fn recompute_wallet(conn: &Connection, user_id: i64) -> Result<()> {
    let total: f64 = conn
        .query_row(
            "SELECT COALESCE(SUM(balance), 0) FROM platform_wallets WHERE user_id = ?1",
            params![user_id],
            |r| r.get(0),
        )
        .unwrap_or(0.0);
    let rounded = powerbot_core::round_half_even(total);
    conn.execute(
        "INSERT INTO wallets (user_id, balance, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET balance = excluded.balance, updated_at = excluded.updated_at",
        params![user_id, rounded, powerbot_core::now_rfc3339()],
    )?;
    Ok(())
}

/// Splits `platform`'s profile away from its current Identity into a new
/// (or reused inactive) owner, preserving total balance on the caller's
/// chosen platform and zeroing the other (§4.2, §8 scenario 5). Runs as one
/// `begin_immediate` transaction (§4.1/§5).
pub fn unlink(conn: &mut Connection, platform: &str, external_id: &str) -> Result<UnlinkResult> {
    powerbot_store::begin_immediate(conn, |tx| {
        let profile = db::get_profile(tx, platform, external_id)?.ok_or(IdentityError::NotLinked)?;
        let kept_user_id = profile.user_id;

        let profiles = db::list_profiles_for_user(tx, kept_user_id)?;
        if profiles.len() <= 1 {
            return Err(IdentityError::NotLinked);
        }

        let new_owner_user_id = match db::find_recoverable_inactive_id(tx, kept_user_id)? {
            Some(inactive_id) => inactive_id,
            None => {
                let fresh = db::insert_identity(tx, &format!("split-of-{kept_user_id}"))?;
                fresh.user_id
            }
        };

        db::reassign_profile_owner(tx, platform, external_id, new_owner_user_id)?;

        tx.execute(
            "INSERT INTO platform_wallets (user_id, platform, balance, updated_at)
             SELECT ?2, platform, balance, ?3 FROM platform_wallets
             WHERE user_id = ?1 AND platform = ?4
             ON CONFLICT(user_id, platform) DO UPDATE SET
                balance = excluded.balance, updated_at = excluded.updated_at",
            params![kept_user_id, new_owner_user_id, powerbot_core::now_rfc3339(), platform],
        )?;
        tx.execute(
            "UPDATE platform_wallets SET balance = 0, updated_at = ?3
             WHERE user_id = ?1 AND platform = ?2",
            params![kept_user_id, platform, powerbot_core::now_rfc3339()],
        )?;

        recompute_wallet(tx, kept_user_id)?;
        recompute_wallet(tx, new_owner_user_id)?;

        db::deactivate_id_link_map_rows_for(tx, kept_user_id)?;
        db::deactivate_linked_account(tx, platform, external_id)?;

        Ok(UnlinkResult {
            kept_user_id,
            new_owner_user_id,
        })
    })
}

/// Walks `id_link_map` exactly one level to find the currently-active
/// owner of `any_user_id` (§11 Open Question Decision: single-level only).
pub fn resolve_active_user_id(conn: &Connection, any_user_id: i64) -> Result<i64> {
    match db::get_id_link_map(conn, any_user_id)? {
        Some((primary, true)) => Ok(primary),
        _ => Ok(any_user_id),
    }
}

/// Moderator operation: forcibly reassigns a Discord identity to
/// `target_identity_id`, merging if it currently belongs elsewhere. Runs as
/// one `begin_immediate` transaction (§4.1/§5).
pub fn force_link_discord_to_identity(
    conn: &mut Connection,
    discord_external_id: &str,
    target_identity_id: i64,
) -> Result<MergeResult> {
    powerbot_store::begin_immediate(conn, |tx| {
        let profile = db::get_profile(tx, "discord", discord_external_id)?
            .ok_or_else(|| IdentityError::NotFound(discord_external_id.to_string()))?;

        if profile.user_id == target_identity_id {
            return Ok(MergeResult {
                primary_user_id: target_identity_id,
                merged_from: None,
            });
        }

        merge_identities(tx, profile.user_id, target_identity_id, "force_link")?;
        db::reassign_profile_owner(tx, "discord", discord_external_id, target_identity_id)?;

        Ok(MergeResult {
            primary_user_id: target_identity_id,
            merged_from: Some(profile.user_id),
        })
    })
}

/// Moderator operation: forcibly splits a Discord identity off its
/// current owner, applying the same split semantics as `unlink`.
pub fn force_unlink(conn: &mut Connection, discord_external_id: &str) -> Result<UnlinkResult> {
    unlink(conn, "discord", discord_external_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = powerbot_store::open_in_memory().unwrap();
        db::init_db(&conn).unwrap();
        conn.execute_batch(
            "CREATE TABLE wallets (user_id INTEGER PRIMARY KEY, balance REAL NOT NULL DEFAULT 0, updated_at TEXT);
             CREATE TABLE platform_wallets (user_id INTEGER, platform TEXT, balance REAL NOT NULL DEFAULT 0, updated_at TEXT, PRIMARY KEY(user_id, platform));
             CREATE TABLE ledger (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER, amount REAL, reason TEXT, created_at TEXT);
             CREATE TABLE earning_cooldowns (user_id INTEGER, scope_id TEXT, last_awarded_at TEXT, PRIMARY KEY(user_id, scope_id));
             CREATE TABLE earning_events (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER, kind TEXT, created_at TEXT);
             CREATE TABLE inventory_items (user_id INTEGER, item_id TEXT, quantity INTEGER NOT NULL DEFAULT 0, PRIMARY KEY(user_id, item_id));",
        )
        .unwrap();
        conn
    }

    #[test]
    fn get_or_create_identity_is_idempotent() {
        let conn = setup();
        let (id1, _, created1) =
            get_or_create_identity(&conn, "discord", "d1", "Alice", None).unwrap();
        let (id2, _, created2) =
            get_or_create_identity(&conn, "discord", "d1", "Alice", None).unwrap();
        assert!(created1);
        assert!(!created2);
        assert_eq!(id1.user_id, id2.user_id);
    }

    #[test]
    fn link_code_merges_wallets_and_resolves() {
        let mut conn = setup();
        let (discord_identity, _, _) =
            get_or_create_identity(&conn, "discord", "d1", "Alice", None).unwrap();
        conn.execute(
            "INSERT INTO platform_wallets (user_id, platform, balance, updated_at) VALUES (?1, 'discord', 10.0, '')",
            params![discord_identity.user_id],
        )
        .unwrap();

        let (yt_identity, _, _) =
            get_or_create_identity(&conn, "youtube", "y1", "Alice", None).unwrap();
        conn.execute(
            "INSERT INTO platform_wallets (user_id, platform, balance, updated_at) VALUES (?1, 'youtube', 5.0, '')",
            params![yt_identity.user_id],
        )
        .unwrap();

        let (code, _expires) = create_link_code(&conn, "d1", "Alice").unwrap();
        let result = consume_link_code(&mut conn, &code, "y1", "Alice", None).unwrap();

        assert_eq!(result.primary_user_id, discord_identity.user_id);
        assert_eq!(result.merged_from, Some(yt_identity.user_id));

        let total: f64 = conn
            .query_row(
                "SELECT balance FROM wallets WHERE user_id = ?1",
                params![discord_identity.user_id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(total, 15.0);

        assert_eq!(
            resolve_active_user_id(&conn, yt_identity.user_id).unwrap(),
            discord_identity.user_id
        );
    }

    #[test]
    fn expired_code_is_rejected() {
        let mut conn = setup();
        get_or_create_identity(&conn, "discord", "d1", "Alice", None).unwrap();
        db::insert_link_token(&conn, "EXPIRED1", "d1", 1, "2000-01-01T00:00:00+00:00").unwrap();
        let result = consume_link_code(&mut conn, "EXPIRED1", "y1", "Alice", None);
        assert!(matches!(result, Err(IdentityError::CodeExpired)));
    }

    #[test]
    fn unlink_preserves_total_balance() {
        let mut conn = setup();
        let (discord_identity, _, _) =
            get_or_create_identity(&conn, "discord", "d1", "Alice", None).unwrap();
        let (yt_identity, _, _) =
            get_or_create_identity(&conn, "youtube", "y1", "Alice", None).unwrap();
        conn.execute(
            "INSERT INTO platform_wallets (user_id, platform, balance, updated_at) VALUES (?1, 'discord', 10.0, '')",
            params![discord_identity.user_id],
        )
        .unwrap();

        let (code, _) = create_link_code(&conn, "d1", "Alice").unwrap();
        consume_link_code(&mut conn, &code, "y1", "Alice", None).unwrap();

        let result = unlink(&mut conn, "youtube", "y1").unwrap();
        assert_eq!(result.kept_user_id, discord_identity.user_id);
        assert_ne!(result.new_owner_user_id, yt_identity.user_id);

        let kept_balance: f64 = conn
            .query_row(
                "SELECT balance FROM wallets WHERE user_id = ?1",
                params![result.kept_user_id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(kept_balance, 10.0);
    }
}
