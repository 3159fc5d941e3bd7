//! Shared data types for the supervisor: worker identity, lifecycle state,
//! and the persisted toggle/autorun flags that survive restarts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of worker processes the supervisor owns. Each maps to one
/// `powerbot-*` binary crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Web,
    ChatBot,
    ChatWatcher,
    Backup,
    WebsocketHub,
}

impl WorkerKind {
    pub fn all() -> [WorkerKind; 5] {
        [
            WorkerKind::Web,
            WorkerKind::ChatBot,
            WorkerKind::ChatWatcher,
            WorkerKind::Backup,
            WorkerKind::WebsocketHub,
        ]
    }

    /// Name of the binary crate the supervisor spawns for this worker.
    pub fn binary_name(&self) -> &'static str {
        match self {
            WorkerKind::Web => "powerbot-web",
            WorkerKind::ChatBot => "powerbot-chatbot",
            WorkerKind::ChatWatcher => "powerbot-chatwatcher",
            WorkerKind::Backup => "powerbot-backup",
            WorkerKind::WebsocketHub => "powerbot-hub",
        }
    }

    /// Short label used in console output and log prefixes.
    pub fn label(&self) -> &'static str {
        match self {
            WorkerKind::Web => "web",
            WorkerKind::ChatBot => "chat_bot",
            WorkerKind::ChatWatcher => "chat_watcher",
            WorkerKind::Backup => "backup",
            WorkerKind::WebsocketHub => "websocket_hub",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for WorkerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(WorkerKind::Web),
            "chat_bot" | "chatbot" => Ok(WorkerKind::ChatBot),
            "chat_watcher" | "chatwatcher" => Ok(WorkerKind::ChatWatcher),
            "backup" => Ok(WorkerKind::Backup),
            "websocket_hub" | "hub" | "ws" => Ok(WorkerKind::WebsocketHub),
            other => Err(other.to_string()),
        }
    }
}

/// Lifecycle state of a worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Down,
    Starting,
    Up,
}

/// Snapshot of one worker's current state, returned by `Supervisor::status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub kind: WorkerKind,
    pub state: WorkerState,
    pub enabled_persisted: bool,
    pub autorun_persisted: bool,
    pub pid: Option<u32>,
    pub last_exit_code: Option<i32>,
}
