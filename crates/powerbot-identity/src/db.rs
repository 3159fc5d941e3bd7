use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::types::{Identity, LinkToken, LinkTokenStatus, PlatformProfile};

pub(crate) fn row_to_identity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Identity> {
    Ok(Identity {
        user_id: row.get(0)?,
        display_name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

pub(crate) fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlatformProfile> {
    Ok(PlatformProfile {
        platform: row.get(0)?,
        external_id: row.get(1)?,
        user_id: row.get(2)?,
        display_name: row.get(3)?,
        avatar_url: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_link_token(row: &rusqlite::Row<'_>) -> rusqlite::Result<LinkToken> {
    use std::str::FromStr;
    let status_str: String = row.get(3)?;
    Ok(LinkToken {
        code: row.get(0)?,
        discord_external_id: row.get(1)?,
        owner_user_id: row.get(2)?,
        status: LinkTokenStatus::from_str(&status_str).unwrap_or(LinkTokenStatus::Expired),
        created_at: row.get(4)?,
        expires_at: row.get(5)?,
        consumed_at: row.get(6)?,
        consumed_by: row.get(7)?,
    })
}

/// Initialise all tables for the identity subsystem. Idempotent — safe to
/// call on every worker startup (§4.1).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_identities_table(conn)?;
    create_platform_profiles_table(conn)?;
    create_link_tokens_table(conn)?;
    create_id_link_map_table(conn)?;
    create_linked_account_audit_table(conn)?;
    Ok(())
}

fn create_identities_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS identities (
            user_id      INTEGER PRIMARY KEY AUTOINCREMENT,
            display_name TEXT NOT NULL,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );",
    )?;
    Ok(())
}

fn create_platform_profiles_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS platform_profiles (
            platform     TEXT NOT NULL,
            external_id  TEXT NOT NULL,
            user_id      INTEGER NOT NULL REFERENCES identities(user_id),
            display_name TEXT NOT NULL,
            avatar_url   TEXT,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL,
            PRIMARY KEY (platform, external_id)
        );
        CREATE INDEX IF NOT EXISTS idx_platform_profiles_owner
            ON platform_profiles (user_id);",
    )?;
    Ok(())
}

fn create_link_tokens_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS link_tokens (
            code                TEXT PRIMARY KEY NOT NULL,
            discord_external_id TEXT NOT NULL,
            owner_user_id       INTEGER NOT NULL REFERENCES identities(user_id),
            status              TEXT NOT NULL DEFAULT 'active',
            created_at          TEXT NOT NULL,
            expires_at          TEXT NOT NULL,
            consumed_at         TEXT,
            consumed_by         TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_link_tokens_discord
            ON link_tokens (discord_external_id, status);",
    )?;
    Ok(())
}

fn create_id_link_map_table(conn: &Connection) -> Result<()> {
    // inactive_user_id is the primary key: an Identity can only ever be
    // merged away once (it's inactive for good after that).
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS id_link_map (
            inactive_user_id INTEGER PRIMARY KEY NOT NULL,
            primary_user_id  INTEGER NOT NULL,
            active           INTEGER NOT NULL DEFAULT 1,
            reason           TEXT NOT NULL,
            created_at       TEXT NOT NULL
        );",
    )?;
    Ok(())
}

fn create_linked_account_audit_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS linked_account_audit (
            id                TEXT PRIMARY KEY NOT NULL,
            user_id           INTEGER NOT NULL,
            platform          TEXT NOT NULL,
            provider_user_id  TEXT NOT NULL,
            is_active         INTEGER NOT NULL DEFAULT 1,
            linked_at         TEXT NOT NULL,
            unlinked_at       TEXT
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_linked_account_active
            ON linked_account_audit (platform, provider_user_id)
            WHERE is_active = 1;",
    )?;
    Ok(())
}

pub fn insert_identity(conn: &Connection, display_name: &str) -> Result<Identity> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "INSERT INTO identities (display_name, created_at, updated_at) VALUES (?1, ?2, ?2)",
        params![display_name, now],
    )?;
    let user_id = conn.last_insert_rowid();
    Ok(Identity {
        user_id,
        display_name: display_name.to_string(),
        created_at: now.clone(),
        updated_at: now,
    })
}

pub fn get_identity(conn: &Connection, user_id: i64) -> Result<Option<Identity>> {
    conn.query_row(
        "SELECT user_id, display_name, created_at, updated_at FROM identities WHERE user_id = ?1",
        params![user_id],
        row_to_identity,
    )
    .optional()
    .map_err(Into::into)
}

pub fn get_profile(
    conn: &Connection,
    platform: &str,
    external_id: &str,
) -> Result<Option<PlatformProfile>> {
    conn.query_row(
        "SELECT platform, external_id, user_id, display_name, avatar_url, created_at, updated_at
         FROM platform_profiles WHERE platform = ?1 AND external_id = ?2",
        params![platform, external_id],
        row_to_profile,
    )
    .optional()
    .map_err(Into::into)
}

pub fn insert_profile(
    conn: &Connection,
    platform: &str,
    external_id: &str,
    user_id: i64,
    display_name: &str,
    avatar_url: Option<&str>,
) -> Result<PlatformProfile> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "INSERT INTO platform_profiles
            (platform, external_id, user_id, display_name, avatar_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![platform, external_id, user_id, display_name, avatar_url, now],
    )?;
    Ok(PlatformProfile {
        platform: platform.to_string(),
        external_id: external_id.to_string(),
        user_id,
        display_name: display_name.to_string(),
        avatar_url: avatar_url.map(str::to_string),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Reassigns a profile to a new owner, used by merge/force-link/unlink.
pub fn reassign_profile_owner(
    conn: &Connection,
    platform: &str,
    external_id: &str,
    new_owner: i64,
) -> Result<()> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "UPDATE platform_profiles SET user_id = ?3, updated_at = ?4
         WHERE platform = ?1 AND external_id = ?2",
        params![platform, external_id, new_owner, now],
    )?;
    Ok(())
}

pub fn list_profiles_for_user(conn: &Connection, user_id: i64) -> Result<Vec<PlatformProfile>> {
    let mut stmt = conn.prepare(
        "SELECT platform, external_id, user_id, display_name, avatar_url, created_at, updated_at
         FROM platform_profiles WHERE user_id = ?1 ORDER BY created_at ASC",
    )?;
    let rows = stmt
        .query_map(params![user_id], row_to_profile)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn insert_link_token(
    conn: &Connection,
    code: &str,
    discord_external_id: &str,
    owner_user_id: i64,
    expires_at: &str,
) -> Result<()> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "INSERT INTO link_tokens
            (code, discord_external_id, owner_user_id, status, created_at, expires_at)
         VALUES (?1, ?2, ?3, 'active', ?4, ?5)",
        params![code, discord_external_id, owner_user_id, now, expires_at],
    )?;
    Ok(())
}

pub fn get_link_token(conn: &Connection, code: &str) -> Result<Option<LinkToken>> {
    conn.query_row(
        "SELECT code, discord_external_id, owner_user_id, status, created_at, expires_at,
                consumed_at, consumed_by
         FROM link_tokens WHERE code = ?1",
        params![code],
        row_to_link_token,
    )
    .optional()
    .map_err(Into::into)
}

pub fn replace_active_tokens_for_discord_id(
    conn: &Connection,
    discord_external_id: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE link_tokens SET status = 'replaced'
         WHERE discord_external_id = ?1 AND status = 'active'",
        params![discord_external_id],
    )?;
    Ok(())
}

pub fn mark_token_consumed(conn: &Connection, code: &str, consumed_by: &str) -> Result<()> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "UPDATE link_tokens SET status = 'consumed', consumed_at = ?2, consumed_by = ?3
         WHERE code = ?1",
        params![code, now, consumed_by],
    )?;
    Ok(())
}

pub fn code_exists(conn: &Connection, code: &str) -> Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM link_tokens WHERE code = ?1",
        params![code],
        |r| r.get(0),
    )?;
    Ok(exists > 0)
}

pub fn insert_id_link_map(
    conn: &Connection,
    inactive_user_id: i64,
    primary_user_id: i64,
    reason: &str,
) -> Result<()> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "INSERT INTO id_link_map (inactive_user_id, primary_user_id, active, reason, created_at)
         VALUES (?1, ?2, 1, ?3, ?4)
         ON CONFLICT(inactive_user_id) DO UPDATE SET
            primary_user_id = excluded.primary_user_id,
            active = 1,
            reason = excluded.reason,
            created_at = excluded.created_at",
        params![inactive_user_id, primary_user_id, reason, now],
    )?;
    Ok(())
}

/// Looks up the single-level mapping for `user_id`, per the Open Question
/// Decision (§11): resolution never loops.
pub fn get_id_link_map(conn: &Connection, inactive_user_id: i64) -> Result<Option<(i64, bool)>> {
    conn.query_row(
        "SELECT primary_user_id, active FROM id_link_map WHERE inactive_user_id = ?1",
        params![inactive_user_id],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? != 0)),
    )
    .optional()
    .map_err(Into::into)
}

/// Deactivates every `id_link_map` row whose `primary_user_id` is
/// `active_user_id` — the set of historical ids that used to resolve here.
pub fn deactivate_id_link_map_rows_for(conn: &Connection, active_user_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE id_link_map SET active = 0 WHERE primary_user_id = ?1 AND active = 1",
        params![active_user_id],
    )?;
    Ok(())
}

/// An inactive id is "recoverable" (reusable as a fresh owner on unlink)
/// if it owns no platform profile of either kind today.
pub fn find_recoverable_inactive_id(conn: &Connection, active_user_id: i64) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT m.inactive_user_id FROM id_link_map m
         WHERE m.primary_user_id = ?1 AND m.active = 1
           AND NOT EXISTS (
               SELECT 1 FROM platform_profiles p WHERE p.user_id = m.inactive_user_id
           )
         ORDER BY m.created_at ASC LIMIT 1",
        params![active_user_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

pub fn insert_linked_account_audit(
    conn: &Connection,
    id: &str,
    user_id: i64,
    platform: &str,
    provider_user_id: &str,
) -> Result<()> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "UPDATE linked_account_audit SET is_active = 0, unlinked_at = ?4
         WHERE platform = ?2 AND provider_user_id = ?3 AND is_active = 1",
        params![id, platform, provider_user_id, now],
    )?;
    conn.execute(
        "INSERT INTO linked_account_audit
            (id, user_id, platform, provider_user_id, is_active, linked_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        params![id, user_id, platform, provider_user_id, now],
    )?;
    Ok(())
}

pub fn deactivate_linked_account(conn: &Connection, platform: &str, provider_user_id: &str) -> Result<()> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "UPDATE linked_account_audit SET is_active = 0, unlinked_at = ?3
         WHERE platform = ?1 AND provider_user_id = ?2 AND is_active = 1",
        params![platform, provider_user_id, now],
    )?;
    Ok(())
}
