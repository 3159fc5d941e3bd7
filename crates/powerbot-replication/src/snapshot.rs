use std::collections::HashMap;
use std::path::{Path, PathBuf};

use powerbot_core::config::BackupConfig;
use rusqlite::types::Value;
use rusqlite::Connection;
use sqlx::mysql::{MySqlArguments, MySqlPoolOptions};
use sqlx::query::Query;
use sqlx::{MySql, MySqlPool, Row};
use tracing::info;

use crate::error::{ReplicationError, Result};
use crate::types::MirrorOutcome;

pub const META_TABLE: &str = "powerbot_backup_metadata";

#[derive(Debug, Clone)]
struct SqliteColumn {
    name: String,
    sql_type: String,
    not_null: bool,
    pk: bool,
}

/// Opens a pooled connection to the remote mirror using the `backup` worker's
/// config. `max_connections(1)` — the replication engine issues one query at
/// a time from a single loop, so pooling buys nothing but adds idle sockets.
pub async fn connect_remote(cfg: &BackupConfig) -> Result<MySqlPool> {
    let url = format!(
        "mysql://{}:{}@{}:{}/{}",
        cfg.db_user, cfg.db_password, cfg.db_host, cfg.db_port, cfg.db_name
    );
    MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(cfg.db_timeout))
        .connect(&url)
        .await
        .map_err(|e| ReplicationError::MirrorFailed(e.to_string()))
}

/// `SELECT 1` against the remote mirror, used by the engine's slow health loop.
pub async fn health_ping(pool: &MySqlPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| ReplicationError::MirrorFailed(e.to_string()))?;
    Ok(())
}

fn list_local_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(tables)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<SqliteColumn>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{table}')"))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(SqliteColumn {
                name: row.get(1)?,
                sql_type: row.get(2)?,
                not_null: row.get::<_, i64>(3)? != 0,
                pk: row.get::<_, i64>(5)? > 0,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();
    Ok(columns)
}

/// int → BIGINT, float/numeric → DOUBLE, date-like → DATETIME, blob →
/// LONGBLOB, otherwise LONGTEXT. Matches the source's coercion table exactly.
fn normalize_sqlite_type(sqlite_type: &str) -> &'static str {
    let t = sqlite_type.to_uppercase();
    if t.contains("INT") {
        "BIGINT"
    } else if ["REAL", "FLOA", "DOUB", "NUMERIC", "DECIMAL"]
        .iter()
        .any(|tok| t.contains(tok))
    {
        "DOUBLE"
    } else if t.contains("DATE") || t.contains("TIME") {
        "DATETIME"
    } else if t.contains("BLOB") {
        "LONGBLOB"
    } else {
        "LONGTEXT"
    }
}

fn has_autoincrement_pk(columns: &[SqliteColumn]) -> bool {
    let pk_columns: Vec<&SqliteColumn> = columns.iter().filter(|c| c.pk).collect();
    pk_columns.len() == 1 && pk_columns[0].sql_type.to_uppercase().contains("INT")
}

async fn create_remote_table(pool: &MySqlPool, table: &str, columns: &[SqliteColumn]) -> Result<()> {
    let auto_inc = has_autoincrement_pk(columns);
    let mut column_sql = Vec::new();
    let mut pk_columns = Vec::new();

    for col in columns {
        let mysql_type = normalize_sqlite_type(&col.sql_type);
        let mut parts = vec![format!("`{}`", col.name), mysql_type.to_string()];
        if col.pk && auto_inc {
            parts.push("AUTO_INCREMENT".to_string());
        }
        if col.not_null || col.pk {
            parts.push("NOT NULL".to_string());
        }
        column_sql.push(parts.join(" "));
        if col.pk {
            pk_columns.push(format!("`{}`", col.name));
        }
    }

    let mut clauses = column_sql;
    if !pk_columns.is_empty() {
        clauses.push(format!("PRIMARY KEY ({})", pk_columns.join(", ")));
    }

    let create_sql = format!(
        "CREATE TABLE IF NOT EXISTS `{table}` ({}) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
        clauses.join(", ")
    );
    sqlx::query(&create_sql)
        .execute(pool)
        .await
        .map_err(|e| ReplicationError::MirrorFailed(e.to_string()))?;
    Ok(())
}

pub async fn ensure_meta_table(pool: &MySqlPool) -> Result<()> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS `{META_TABLE}` (
            id BIGINT NOT NULL AUTO_INCREMENT,
            backup_tag VARCHAR(64) NOT NULL,
            created_at DATETIME NOT NULL,
            source VARCHAR(32) NOT NULL,
            note TEXT NULL,
            PRIMARY KEY (id)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
    );
    sqlx::query(&sql)
        .execute(pool)
        .await
        .map_err(|e| ReplicationError::MirrorFailed(e.to_string()))?;
    Ok(())
}

fn bind_value(
    query: Query<'_, MySql, MySqlArguments>,
    value: Value,
) -> Query<'_, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(Option::<i64>::None),
        Value::Integer(i) => query.bind(i),
        Value::Real(f) => query.bind(f),
        Value::Text(s) => query.bind(s),
        Value::Blob(b) => query.bind(b),
    }
}

/// Copies `db_path` to `snapshots_dir/autosave_<ts>.db`. Best-effort: the
/// caller still records a manifest entry even when this fails, so callers
/// decide whether to bail out.
pub fn create_snapshot_file(db_path: &Path, snapshots_dir: &Path, ts: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(snapshots_dir)?;
    let file_path = snapshots_dir.join(format!("autosave_{ts}.db"));
    std::fs::copy(db_path, &file_path)
        .map_err(|e| ReplicationError::SnapshotFailed(e.to_string()))?;
    Ok(file_path)
}

/// Drops remote tables that are no longer present locally and aren't the
/// meta table. Failures here are logged and reported, never fatal.
pub async fn cleanup_orphan_tables(conn: &Connection, pool: &MySqlPool) -> Result<(bool, String)> {
    let local_tables: std::collections::HashSet<String> =
        list_local_tables(conn)?.into_iter().collect();

    let remote_tables: Vec<String> = match sqlx::query("SHOW TABLES")
        .fetch_all(pool)
        .await
    {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| row.try_get::<String, usize>(0).ok())
            .collect(),
        Err(e) => return Ok((false, format!("failed to list remote tables: {e}"))),
    };

    let mut dropped = 0usize;
    for table in &remote_tables {
        if table == META_TABLE || local_tables.contains(table) {
            continue;
        }
        if sqlx::query(&format!("DROP TABLE IF EXISTS `{table}`"))
            .execute(pool)
            .await
            .is_ok()
        {
            dropped += 1;
        }
    }
    Ok((true, format!("orphan tables dropped: {dropped}")))
}

/// Replace-strategy mirror: for each local table, recreate its remote
/// counterpart, `DELETE` the remote rows, and batch-`INSERT` the current
/// local contents. Writes one row to the meta table on success.
pub async fn mirror_to_remote(conn: &Connection, pool: &MySqlPool, tag: &str) -> Result<MirrorOutcome> {
    ensure_meta_table(pool).await?;

    let tables = list_local_tables(conn)?;
    let mut table_row_counts = HashMap::new();

    for table in &tables {
        let columns = table_columns(conn, table)?;
        if columns.is_empty() {
            continue;
        }
        create_remote_table(pool, table, &columns)
            .await
            .map_err(|e| ReplicationError::MirrorFailed(format!("{table}: {e}")))?;

        sqlx::query(&format!("DELETE FROM `{table}`"))
            .execute(pool)
            .await
            .map_err(|e| ReplicationError::MirrorFailed(format!("{table}: {e}")))?;

        let col_names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let select_sql = format!(
            "SELECT {} FROM `{table}`",
            col_names
                .iter()
                .map(|c| format!("`{c}`"))
                .collect::<Vec<_>>()
                .join(",")
        );
        let mut stmt = conn.prepare(&select_sql)?;
        let row_count = columns.len();
        let rows: Vec<Vec<Value>> = stmt
            .query_map([], |row| {
                (0..row_count).map(|i| row.get::<_, Value>(i)).collect()
            })?
            .filter_map(|r| r.ok())
            .collect();

        if !rows.is_empty() {
            let placeholders = vec!["?"; col_names.len()].join(",");
            let insert_sql = format!(
                "INSERT INTO `{table}` ({}) VALUES ({placeholders})",
                col_names
                    .iter()
                    .map(|c| format!("`{c}`"))
                    .collect::<Vec<_>>()
                    .join(",")
            );
            for row in &rows {
                let mut query = sqlx::query(&insert_sql);
                for value in row.iter().cloned() {
                    query = bind_value(query, value);
                }
                query
                    .execute(pool)
                    .await
                    .map_err(|e| ReplicationError::MirrorFailed(format!("{table}: {e}")))?;
            }
        }
        table_row_counts.insert(table.clone(), rows.len() as i64);
    }

    sqlx::query(&format!(
        "INSERT INTO `{META_TABLE}` (backup_tag, created_at, source, note) VALUES (?, ?, ?, ?)"
    ))
    .bind(tag)
    .bind(powerbot_core::now_rfc3339())
    .bind("sqlite_to_mysql")
    .bind("driver=sqlx/mysql")
    .execute(pool)
    .await
    .map_err(|e| ReplicationError::MirrorFailed(e.to_string()))?;

    info!(tag, tables = tables.len(), "mirror to remote completed");

    Ok(MirrorOutcome {
        ok: true,
        message: format!("mirrored {} tables", tables.len()),
        table_row_counts,
    })
}
