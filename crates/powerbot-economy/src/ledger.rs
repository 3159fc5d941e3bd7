use rusqlite::Connection;

use crate::db;
use crate::error::{EconomyError, Result};
use crate::types::{AwardOutcome, LeaderboardEntry, TransferOutcome};

const KNOWN_PLATFORMS: [&str; 2] = ["discord", "youtube"];

/// Credits `amount` to `user_id` for a message-earning event, gated by a
/// per-(user, scope) cooldown and, when `source_id` is given, idempotent
/// against redelivery. Runs entirely inside `conn`'s current transaction —
/// callers wrap this in `powerbot_store::begin_immediate` (§4.3).
pub fn award_message_points(
    conn: &Connection,
    platform: &str,
    user_id: i64,
    scope_id: &str,
    amount: f64,
    interval_seconds: i64,
    source_id: Option<&str>,
) -> Result<AwardOutcome> {
    let amount = powerbot_core::round_half_even(amount);
    if amount <= 0.0 {
        return Ok(AwardOutcome {
            awarded: false,
            points_added: 0.0,
            new_total: None,
        });
    }

    if let Some(source_id) = source_id {
        if db::earning_event_exists(conn, platform, source_id)? {
            return Ok(AwardOutcome {
                awarded: false,
                points_added: 0.0,
                new_total: None,
            });
        }
    }

    if let Some(cooldown) = db::get_cooldown(conn, user_id, scope_id)? {
        let elapsed = seconds_since(&cooldown.last_awarded_at);
        if elapsed < interval_seconds {
            return Ok(AwardOutcome {
                awarded: false,
                points_added: 0.0,
                new_total: None,
            });
        }
    }

    let new_total = db::credit_platform_balance(conn, user_id, platform, amount)?;
    db::insert_ledger_entry(
        conn,
        user_id,
        amount,
        "message_earning",
        Some(platform),
        Some(scope_id),
        source_id,
    )?;
    if let Some(source_id) = source_id {
        db::insert_earning_event(conn, platform, source_id, user_id)?;
    }
    db::upsert_cooldown(conn, user_id, scope_id)?;

    Ok(AwardOutcome {
        awarded: true,
        points_added: amount,
        new_total: Some(new_total),
    })
}

fn seconds_since(rfc3339: &str) -> i64 {
    chrono::DateTime::parse_from_rfc3339(rfc3339)
        .map(|then| (chrono::Utc::now() - then.with_timezone(&chrono::Utc)).num_seconds())
        .unwrap_or(i64::MAX)
}

/// Applies a signed balance change. Positive deltas credit
/// `preferred_platform`; negative deltas deduct across all platforms in
/// `[preferred_platform, discord, youtube]` order until satisfied, or fail
/// with `InsufficientFunds` without mutating anything (§4.3).
pub fn apply_balance_delta(
    conn: &Connection,
    user_id: i64,
    delta: f64,
    reason: &str,
    preferred_platform: &str,
) -> Result<f64> {
    let delta = powerbot_core::round_half_even(delta);
    if delta == 0.0 {
        return Err(EconomyError::InvalidAmount(delta));
    }

    let new_total = if delta > 0.0 {
        let total = db::credit_platform_balance(conn, user_id, preferred_platform, delta)?;
        db::insert_ledger_entry(conn, user_id, delta, reason, Some(preferred_platform), None, None)?;
        total
    } else {
        deduct_combined(conn, user_id, -delta, preferred_platform)?;
        db::insert_ledger_entry(conn, user_id, delta, reason, None, None, None)?;
        db::sync_wallet_total(conn, user_id)?
    };

    Ok(new_total)
}

/// Deducts `amount` from `user_id`'s combined balance, draining
/// `preferred_platform` first then the remaining known platforms in a
/// fixed order, failing atomically if the total is insufficient.
fn deduct_combined(conn: &Connection, user_id: i64, amount: f64, preferred_platform: &str) -> Result<()> {
    let mut pending = powerbot_core::round_half_even(amount);
    if pending <= 0.0 {
        return Ok(());
    }

    let wallets = db::list_platform_wallets(conn, user_id)?;
    let mut balances: std::collections::HashMap<&str, f64> =
        KNOWN_PLATFORMS.iter().map(|p| (*p, 0.0)).collect();
    for w in &wallets {
        if let Some(slot) = balances.get_mut(w.platform.as_str()) {
            *slot = w.balance;
        }
    }

    let available: f64 = balances.values().sum();
    if available < pending {
        return Err(EconomyError::InsufficientFunds {
            available,
            requested: pending,
        });
    }

    let mut order: Vec<&str> = vec![preferred_platform];
    for p in KNOWN_PLATFORMS {
        if !order.contains(&p) {
            order.push(p);
        }
    }

    for platform in order {
        if pending <= 0.0 {
            break;
        }
        let current = *balances.get(platform).unwrap_or(&0.0);
        if current <= 0.0 {
            continue;
        }
        let take = powerbot_core::round_half_even(current.min(pending));
        if take <= 0.0 {
            continue;
        }
        db::deduct_platform_balance(conn, user_id, platform, take)?;
        pending = powerbot_core::round_half_even(pending - take);
    }

    Ok(())
}

/// Moves `amount` from `from` to `to` on `platform`, rejecting
/// self-transfers and non-positive amounts, and emitting matching
/// `transfer_out` / `transfer_in` ledger rows (§4.3).
pub fn transfer(conn: &Connection, from: i64, to: i64, amount: f64, platform: &str) -> Result<TransferOutcome> {
    if from == to {
        return Err(EconomyError::SelfTransfer);
    }
    let amount = powerbot_core::round_half_even(amount);
    if amount <= 0.0 {
        return Err(EconomyError::InvalidAmount(amount));
    }

    deduct_combined(conn, from, amount, platform)?;
    db::insert_ledger_entry(conn, from, -amount, "transfer_out", Some(platform), None, None)?;
    let from_total = db::sync_wallet_total(conn, from)?;

    let to_total = db::credit_platform_balance(conn, to, platform, amount)?;
    db::insert_ledger_entry(conn, to, amount, "transfer_in", Some(platform), None, None)?;

    Ok(TransferOutcome { from_total, to_total })
}

pub fn get_total_balance(conn: &Connection, user_id: i64) -> Result<f64> {
    Ok(db::get_wallet(conn, user_id)?.map(|w| w.balance).unwrap_or(0.0))
}

pub fn get_platform_balances(conn: &Connection, user_id: i64) -> Result<std::collections::HashMap<String, f64>> {
    let mut balances: std::collections::HashMap<String, f64> =
        KNOWN_PLATFORMS.iter().map(|p| (p.to_string(), 0.0)).collect();
    for w in db::list_platform_wallets(conn, user_id)? {
        balances.insert(w.platform, w.balance);
    }
    Ok(balances)
}

pub fn top_leaderboard(conn: &Connection, limit: i64) -> Result<Vec<LeaderboardEntry>> {
    Ok(db::top_leaderboard(conn, limit)?
        .into_iter()
        .map(|(user_id, balance)| LeaderboardEntry { user_id, balance })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = powerbot_store::open_in_memory().unwrap();
        db::init_db(&conn).unwrap();
        conn
    }

    #[test]
    fn award_message_points_respects_cooldown() {
        let conn = setup();
        let first = award_message_points(&conn, "discord", 1, "guild1", 5.0, 60, None).unwrap();
        assert!(first.awarded);
        assert_eq!(first.new_total, Some(5.0));

        let second = award_message_points(&conn, "discord", 1, "guild1", 5.0, 60, None).unwrap();
        assert!(!second.awarded);
        assert_eq!(get_total_balance(&conn, 1).unwrap(), 5.0);
    }

    #[test]
    fn award_message_points_is_idempotent_on_source_id() {
        let conn = setup();
        let first = award_message_points(&conn, "discord", 1, "guild1", 5.0, 0, Some("msg-1")).unwrap();
        assert!(first.awarded);
        let replay = award_message_points(&conn, "discord", 1, "guild1", 5.0, 0, Some("msg-1")).unwrap();
        assert!(!replay.awarded);
    }

    #[test]
    fn transfer_moves_balance_between_users() {
        let conn = setup();
        db::credit_platform_balance(&conn, 1, "discord", 10.0).unwrap();

        let outcome = transfer(&conn, 1, 2, 4.0, "discord").unwrap();
        assert_eq!(outcome.from_total, 6.0);
        assert_eq!(outcome.to_total, 4.0);
    }

    #[test]
    fn transfer_rejects_self_and_overdraft() {
        let conn = setup();
        db::credit_platform_balance(&conn, 1, "discord", 10.0).unwrap();

        assert!(matches!(transfer(&conn, 1, 1, 1.0, "discord"), Err(EconomyError::SelfTransfer)));
        assert!(matches!(
            transfer(&conn, 1, 2, 50.0, "discord"),
            Err(EconomyError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn apply_balance_delta_deducts_across_platforms() {
        let conn = setup();
        db::credit_platform_balance(&conn, 1, "discord", 3.0).unwrap();
        db::credit_platform_balance(&conn, 1, "youtube", 7.0).unwrap();

        let total = apply_balance_delta(&conn, 1, -5.0, "purchase", "discord").unwrap();
        assert_eq!(total, 5.0);

        let balances = get_platform_balances(&conn, 1).unwrap();
        assert_eq!(balances["discord"], 0.0);
        assert_eq!(balances["youtube"], 5.0);
    }

    #[test]
    fn top_leaderboard_orders_by_balance_desc() {
        let conn = setup();
        db::credit_platform_balance(&conn, 1, "discord", 3.0).unwrap();
        db::credit_platform_balance(&conn, 2, "discord", 9.0).unwrap();

        let top = top_leaderboard(&conn, 10).unwrap();
        assert_eq!(top[0].user_id, 2);
        assert_eq!(top[1].user_id, 1);
    }
}
