use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::types::{EarningCooldown, LedgerEntry, PlatformWallet, Wallet};

/// Initialise all tables for the economy subsystem. Idempotent — safe to
/// call on every worker startup (§4.1).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS wallets (
            user_id    INTEGER PRIMARY KEY NOT NULL,
            balance    REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS platform_wallets (
            user_id    INTEGER NOT NULL,
            platform   TEXT NOT NULL,
            balance    REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, platform)
        );

        CREATE TABLE IF NOT EXISTS ledger (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id    INTEGER NOT NULL,
            amount     REAL NOT NULL,
            reason     TEXT NOT NULL,
            platform   TEXT,
            scope_id   TEXT,
            source_id  TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_ledger_user ON ledger (user_id);

        CREATE TABLE IF NOT EXISTS earning_cooldowns (
            user_id         INTEGER NOT NULL,
            scope_id        TEXT NOT NULL,
            last_awarded_at TEXT NOT NULL,
            PRIMARY KEY (user_id, scope_id)
        );

        CREATE TABLE IF NOT EXISTS earning_events (
            platform   TEXT NOT NULL,
            source_id  TEXT NOT NULL,
            user_id    INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (platform, source_id)
        );

        CREATE TABLE IF NOT EXISTS inventory_items (
            user_id    INTEGER NOT NULL,
            item_id    TEXT NOT NULL,
            quantity   INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, item_id)
        );",
    )?;
    Ok(())
}

pub(crate) fn row_to_wallet(row: &rusqlite::Row<'_>) -> rusqlite::Result<Wallet> {
    Ok(Wallet {
        user_id: row.get(0)?,
        balance: row.get(1)?,
        updated_at: row.get(2)?,
    })
}

pub(crate) fn row_to_platform_wallet(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlatformWallet> {
    Ok(PlatformWallet {
        user_id: row.get(0)?,
        platform: row.get(1)?,
        balance: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

pub fn get_wallet(conn: &Connection, user_id: i64) -> Result<Option<Wallet>> {
    conn.query_row(
        "SELECT user_id, balance, updated_at FROM wallets WHERE user_id = ?1",
        params![user_id],
        row_to_wallet,
    )
    .optional()
    .map_err(Into::into)
}

pub fn list_platform_wallets(conn: &Connection, user_id: i64) -> Result<Vec<PlatformWallet>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, platform, balance, updated_at FROM platform_wallets WHERE user_id = ?1",
    )?;
    let rows = stmt
        .query_map(params![user_id], row_to_platform_wallet)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Credits `amount` onto `user_id`'s `platform` wallet, creating the row if
/// absent, then recomputes and upserts the total `Wallet` (§4.3 step 4-5).
pub fn credit_platform_balance(
    conn: &Connection,
    user_id: i64,
    platform: &str,
    amount: f64,
) -> Result<f64> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "INSERT INTO platform_wallets (user_id, platform, balance, updated_at)
         VALUES (?1, ?2, 0, ?3)
         ON CONFLICT(user_id, platform) DO NOTHING",
        params![user_id, platform, now],
    )?;
    conn.execute(
        "UPDATE platform_wallets SET balance = balance + ?3, updated_at = ?4
         WHERE user_id = ?1 AND platform = ?2",
        params![user_id, platform, amount, now],
    )?;
    sync_wallet_total(conn, user_id)
}

/// Recomputes `wallets.balance` as the rounded sum of every platform
/// wallet and upserts it.
pub fn sync_wallet_total(conn: &Connection, user_id: i64) -> Result<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(balance), 0) FROM platform_wallets WHERE user_id = ?1",
        params![user_id],
        |r| r.get(0),
    )?;
    let rounded = powerbot_core::round_half_even(total);
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "INSERT INTO wallets (user_id, balance, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET balance = excluded.balance, updated_at = excluded.updated_at",
        params![user_id, rounded, now],
    )?;
    Ok(rounded)
}

pub fn insert_ledger_entry(
    conn: &Connection,
    user_id: i64,
    amount: f64,
    reason: &str,
    platform: Option<&str>,
    scope_id: Option<&str>,
    source_id: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO ledger (user_id, amount, reason, platform, scope_id, source_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_id,
            amount,
            reason,
            platform,
            scope_id,
            source_id,
            powerbot_core::now_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn earning_event_exists(conn: &Connection, platform: &str, source_id: &str) -> Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM earning_events WHERE platform = ?1 AND source_id = ?2",
        params![platform, source_id],
        |r| r.get(0),
    )?;
    Ok(exists > 0)
}

pub fn insert_earning_event(
    conn: &Connection,
    platform: &str,
    source_id: &str,
    user_id: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO earning_events (platform, source_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![platform, source_id, user_id, powerbot_core::now_rfc3339()],
    )?;
    Ok(())
}

pub fn get_cooldown(conn: &Connection, user_id: i64, scope_id: &str) -> Result<Option<EarningCooldown>> {
    conn.query_row(
        "SELECT user_id, scope_id, last_awarded_at FROM earning_cooldowns
         WHERE user_id = ?1 AND scope_id = ?2",
        params![user_id, scope_id],
        |row| {
            Ok(EarningCooldown {
                user_id: row.get(0)?,
                scope_id: row.get(1)?,
                last_awarded_at: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

pub fn upsert_cooldown(conn: &Connection, user_id: i64, scope_id: &str) -> Result<()> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "INSERT INTO earning_cooldowns (user_id, scope_id, last_awarded_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id, scope_id) DO UPDATE SET last_awarded_at = excluded.last_awarded_at",
        params![user_id, scope_id, now],
    )?;
    Ok(())
}

pub fn deduct_platform_balance(conn: &Connection, user_id: i64, platform: &str, amount: f64) -> Result<()> {
    let now = powerbot_core::now_rfc3339();
    conn.execute(
        "UPDATE platform_wallets SET balance = balance - ?3, updated_at = ?4
         WHERE user_id = ?1 AND platform = ?2",
        params![user_id, platform, amount, now],
    )?;
    Ok(())
}

pub fn top_leaderboard(conn: &Connection, limit: i64) -> Result<Vec<(i64, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, balance FROM wallets ORDER BY balance DESC, user_id ASC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn ledger_history(conn: &Connection, user_id: i64, limit: i64) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, amount, reason, platform, scope_id, source_id, created_at
         FROM ledger WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![user_id, limit], |row| {
            Ok(LedgerEntry {
                id: row.get(0)?,
                user_id: row.get(1)?,
                amount: row.get(2)?,
                reason: row.get(3)?,
                platform: row.get(4)?,
                scope_id: row.get(5)?,
                source_id: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
