//! Classifies and tails a worker's stdout/stderr streams.
//!
//! Mirrors `_stream_backup_logs` from the original console: recognized emoji
//! prefixes are stripped before display, and a line is classified by a
//! case-insensitive substring match rather than the stream it came from —
//! stderr output that doesn't look like an error still logs at info level.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tracing::{error, info, warn};

const RECOGNIZED_PREFIXES: &[&str] = &[
    "💾 BACKUP:",
    "✅ BACKUP:",
    "⚠️ BACKUP:",
    "❌ BACKUP:",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

fn strip_known_prefix(line: &str) -> &str {
    let trimmed = line.trim();
    for prefix in RECOGNIZED_PREFIXES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.trim();
        }
    }
    trimmed
}

/// Classifies one already-prefix-stripped log line.
pub fn classify(line: &str) -> LogLevel {
    let lower = line.to_ascii_lowercase();
    if lower.contains("traceback") || lower.contains("error") || lower.contains("exception") {
        LogLevel::Error
    } else {
        LogLevel::Info
    }
}

fn emit(kind: &str, stream: &str, raw: &str) {
    let line = strip_known_prefix(raw);
    if line.is_empty() {
        return;
    }
    match classify(line) {
        LogLevel::Error => error!(worker = kind, stream, "{line}"),
        LogLevel::Warn => warn!(worker = kind, stream, "{line}"),
        LogLevel::Info => info!(worker = kind, stream, "{line}"),
    }
}

/// Spawns a task that reads `stdout` line by line and logs each at the
/// classified level, tagged with the worker's label for the console.
pub fn spawn_stdout_tail(kind: &'static str, stdout: ChildStdout) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => emit(kind, "stdout", &line),
                Ok(None) => break,
                Err(e) => {
                    warn!(worker = kind, error = %e, "stdout tail read error");
                    break;
                }
            }
        }
    });
}

/// Spawns a task that reads `stderr` line by line. stderr lines that contain
/// traceback/error/exception log at error level; anything else logs at warn,
/// since a worker can legitimately write non-error diagnostics to stderr.
pub fn spawn_stderr_tail(kind: &'static str, stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(raw)) => {
                    let line = strip_known_prefix(&raw);
                    if line.is_empty() {
                        continue;
                    }
                    let lower = line.to_ascii_lowercase();
                    if lower.contains("traceback") || lower.contains("error") || lower.contains("exception") {
                        error!(worker = kind, stream = "stderr", "{line}");
                    } else {
                        warn!(worker = kind, stream = "stderr", "{line}");
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(worker = kind, error = %e, "stderr tail read error");
                    break;
                }
            }
        }
    });
}
