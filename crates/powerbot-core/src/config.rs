use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Settings for the `backup` worker (Replication Engine). Env vars use the
/// `BACKUP_` prefix; the remote DB connection fields additionally fall back
/// to `MYSQL_*` then `DB_*` when the `BACKUP_DB_*` variant is unset, per the
/// documented fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_db_host")]
    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    #[serde(default = "default_db_user")]
    pub db_user: String,
    #[serde(default)]
    pub db_password: String,
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_db_timeout")]
    pub db_timeout: u64,
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
    #[serde(default = "default_healthcheck_seconds")]
    pub healthcheck_seconds: u64,
    #[serde(default)]
    pub healthcheck_verbose: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_user: default_db_user(),
            db_password: String::new(),
            db_name: default_db_name(),
            db_timeout: default_db_timeout(),
            poll_seconds: default_poll_seconds(),
            healthcheck_seconds: default_healthcheck_seconds(),
            healthcheck_verbose: false,
        }
    }
}

fn default_db_host() -> String {
    "127.0.0.1".to_string()
}
fn default_db_port() -> u16 {
    3306
}
fn default_db_user() -> String {
    "powerbot".to_string()
}
fn default_db_name() -> String {
    "powerbot".to_string()
}
fn default_db_timeout() -> u64 {
    10
}
fn default_poll_seconds() -> u64 {
    300
}
fn default_healthcheck_seconds() -> u64 {
    60
}

impl BackupConfig {
    /// Layers, lowest to highest priority: defaults, `DB_*`, `MYSQL_*`,
    /// `BACKUP_DB_*`/`BACKUP_*`, `config.toml`'s `[backup]` table.
    ///
    /// Figment merges later providers over earlier ones, so each fallback
    /// tier is merged before the tier that should win.
    pub fn load(toml_path: &str) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(BackupConfig::default()))
            .merge(db_fallback_env("DB_"))
            .merge(db_fallback_env("MYSQL_"))
            .merge(Env::prefixed("BACKUP_").split("_"))
            .merge(Toml::file(toml_path).nested());

        figment
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }
}

/// Maps the generic fallback prefixes (`DB_`, `MYSQL_`) onto the
/// `BackupConfig` field names, since those env vars don't share the
/// `BACKUP_` prefix the rest of the struct uses.
fn db_fallback_env(prefix: &str) -> figment::providers::Serialized<std::collections::BTreeMap<&'static str, String>> {
    let mut map = std::collections::BTreeMap::new();
    for (key, field) in [
        ("HOST", "db_host"),
        ("PORT", "db_port"),
        ("USER", "db_user"),
        ("PASSWORD", "db_password"),
        ("NAME", "db_name"),
        ("TIMEOUT", "db_timeout"),
    ] {
        if let Ok(v) = std::env::var(format!("{prefix}{key}")) {
            map.insert(field, v);
        }
    }
    Serialized::defaults(map)
}

/// Settings for the `web` worker (static/API HTTP server).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    /// Format: `"/url=dir;/url=dir"`.
    #[serde(default)]
    pub static_mounts: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            index_file: default_index_file(),
            static_mounts: String::new(),
        }
    }
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}
fn default_web_port() -> u16 {
    8080
}
fn default_index_file() -> String {
    "index.html".to_string()
}

impl WebConfig {
    pub fn load(toml_path: &str) -> Result<Self> {
        Figment::from(Serialized::defaults(WebConfig::default()))
            .merge(Toml::file(toml_path).nested())
            .merge(Env::prefixed("WEB_").split("_"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Parses `static_mounts` into `(url_prefix, directory)` pairs.
    pub fn parsed_static_mounts(&self) -> Vec<(String, String)> {
        self.static_mounts
            .split(';')
            .filter(|s| !s.is_empty())
            .filter_map(|entry| entry.split_once('='))
            .map(|(url, dir)| (url.to_string(), dir.to_string()))
            .collect()
    }
}

/// Settings for the `wsocket` worker (LAN broadcast hub).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsocketConfig {
    #[serde(default = "default_ws_host")]
    pub host: String,
    #[serde(default = "default_ws_port")]
    pub port: u16,
}

impl Default for WsocketConfig {
    fn default() -> Self {
        Self {
            host: default_ws_host(),
            port: default_ws_port(),
        }
    }
}

fn default_ws_host() -> String {
    "0.0.0.0".to_string()
}
fn default_ws_port() -> u16 {
    8765
}

impl WsocketConfig {
    pub fn load(toml_path: &str) -> Result<Self> {
        Figment::from(Serialized::defaults(WsocketConfig::default()))
            .merge(Toml::file(toml_path).nested())
            .merge(Env::prefixed("WSOCKET_").split("_"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }
}

/// Settings for the `chat_bot` worker (message-earning + polling cadence).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatBotConfig {
    #[serde(default = "default_chat_platform")]
    pub platform: String,
    #[serde(default = "default_chat_id")]
    pub chat_id: String,
    #[serde(default = "default_chat_scope")]
    pub scope_id: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_points_amount")]
    pub points_per_message: f64,
    #[serde(default = "default_points_interval")]
    pub points_interval_seconds: i64,
}

impl Default for ChatBotConfig {
    fn default() -> Self {
        Self {
            platform: default_chat_platform(),
            chat_id: default_chat_id(),
            scope_id: default_chat_scope(),
            poll_interval_ms: default_poll_interval_ms(),
            points_per_message: default_points_amount(),
            points_interval_seconds: default_points_interval(),
        }
    }
}

fn default_chat_platform() -> String {
    "youtube".to_string()
}
fn default_chat_id() -> String {
    String::new()
}
fn default_chat_scope() -> String {
    "global".to_string()
}
fn default_poll_interval_ms() -> u64 {
    5000
}
fn default_points_amount() -> f64 {
    1.0
}
fn default_points_interval() -> i64 {
    60
}

impl ChatBotConfig {
    pub fn load(toml_path: &str) -> Result<Self> {
        Figment::from(Serialized::defaults(ChatBotConfig::default()))
            .merge(Toml::file(toml_path).nested())
            .merge(Env::prefixed("CHATBOT_").split("_"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }
}

/// Settings for the `chat_watcher` worker (broadcast-detection cadence).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatWatcherConfig {
    #[serde(default = "default_chat_platform")]
    pub platform: String,
    #[serde(default = "default_watch_poll_seconds")]
    pub poll_seconds: u64,
}

impl Default for ChatWatcherConfig {
    fn default() -> Self {
        Self {
            platform: default_chat_platform(),
            poll_seconds: default_watch_poll_seconds(),
        }
    }
}

fn default_watch_poll_seconds() -> u64 {
    60
}

impl ChatWatcherConfig {
    pub fn load(toml_path: &str) -> Result<Self> {
        Figment::from(Serialized::defaults(ChatWatcherConfig::default()))
            .merge(Toml::file(toml_path).nested())
            .merge(Env::prefixed("CHATWATCHER_").split("_"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_config_defaults_without_file() {
        let cfg = WebConfig::load("/nonexistent/config.toml").unwrap();
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn static_mounts_parse() {
        let cfg = WebConfig {
            static_mounts: "/assets=./public;/ui=./dist".to_string(),
            ..WebConfig::default()
        };
        let mounts = cfg.parsed_static_mounts();
        assert_eq!(
            mounts,
            vec![
                ("/assets".to_string(), "./public".to_string()),
                ("/ui".to_string(), "./dist".to_string()),
            ]
        );
    }

    #[test]
    fn backup_config_db_fallback_chain() {
        std::env::remove_var("BACKUP_DB_HOST");
        std::env::remove_var("MYSQL_HOST");
        std::env::set_var("DB_HOST", "db-fallback-host");
        let cfg = BackupConfig::load("/nonexistent/config.toml").unwrap();
        assert_eq!(cfg.db_host, "db-fallback-host");
        std::env::set_var("MYSQL_HOST", "mysql-host");
        let cfg = BackupConfig::load("/nonexistent/config.toml").unwrap();
        assert_eq!(cfg.db_host, "mysql-host");
        std::env::remove_var("DB_HOST");
        std::env::remove_var("MYSQL_HOST");
    }
}
