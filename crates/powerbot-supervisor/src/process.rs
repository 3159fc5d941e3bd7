//! Spawns a worker binary and carries it through the terminate-then-kill
//! escalation used by `stop()`.
//!
//! Grounded on the teacher's `exec()` PID-based SIGKILL path and the
//! original's `_stop_backup_process`: `terminate()` (SIGTERM), wait up to a
//! bounded grace period, then `kill()` (SIGKILL) if it hasn't exited.

use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::error::{Result, SupervisorError};
use crate::logtail;
use crate::types::WorkerKind;

/// How long `stop()` waits for a graceful exit before escalating to SIGKILL.
const STOP_GRACE: Duration = Duration::from_secs(8);

/// How long `start()` waits before checking the child is still alive.
const START_GRACE: Duration = Duration::from_secs(1);

pub struct RunningWorker {
    pub child: Child,
    pub pid: Option<u32>,
}

/// Spawns `kind`'s binary with stdout/stderr piped to the log tail, waits
/// `START_GRACE`, then checks the child is still alive. Returns the last
/// stderr line as the failure reason if it already exited.
pub async fn start(kind: WorkerKind, binary_path: &str) -> Result<RunningWorker> {
    let mut child = Command::new(binary_path)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| SupervisorError::SpawnFailed {
            kind: kind.to_string(),
            reason: e.to_string(),
        })?;

    let pid = child.id();
    let label: &'static str = Box::leak(kind.label().to_string().into_boxed_str());

    if let Some(stdout) = child.stdout.take() {
        logtail::spawn_stdout_tail(label, stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        logtail::spawn_stderr_tail(label, stderr);
    }

    tokio::time::sleep(START_GRACE).await;

    match child.try_wait() {
        Ok(None) => {
            info!(worker = %kind, pid, "worker started");
            Ok(RunningWorker { child, pid })
        }
        Ok(Some(status)) => {
            let reason = format!("exited immediately with status {status}");
            warn!(worker = %kind, %reason, "worker failed to start");
            Err(SupervisorError::SpawnFailed {
                kind: kind.to_string(),
                reason,
            })
        }
        Err(e) => Err(SupervisorError::Io(e)),
    }
}

/// Sends SIGTERM, waits up to `STOP_GRACE` for a clean exit, then escalates
/// to SIGKILL.
pub async fn stop(kind: WorkerKind, worker: &mut RunningWorker) -> Result<Option<i32>> {
    if let Some(pid) = worker.pid {
        #[cfg(unix)]
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }

    let waited = tokio::time::timeout(STOP_GRACE, worker.child.wait()).await;
    match waited {
        Ok(Ok(status)) => {
            info!(worker = %kind, "worker stopped cleanly");
            Ok(status.code())
        }
        Ok(Err(e)) => Err(SupervisorError::Io(e)),
        Err(_elapsed) => {
            warn!(worker = %kind, "worker did not exit within grace period, sending SIGKILL");
            if let Some(pid) = worker.pid {
                #[cfg(unix)]
                unsafe {
                    libc::kill(pid as libc::pid_t, libc::SIGKILL);
                }
            }
            match worker.child.wait().await {
                Ok(status) => Ok(status.code()),
                Err(e) => Err(SupervisorError::Io(e)),
            }
        }
    }
}
