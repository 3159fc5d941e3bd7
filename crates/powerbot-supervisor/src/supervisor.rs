//! `Supervisor` — owns the lifecycle state machine for every worker kind.
//!
//! Replaces the teacher's `TerminalManager` (which multiplexed PTY sessions
//! and ad-hoc background jobs) with a manager over a fixed, known set of
//! worker binaries: `DOWN --start--> STARTING --success--> UP`, with a
//! failure path back to `DOWN` that records `last_exit_code` and forces the
//! persisted `enabled` flag to `false` so a later `on` retries cleanly.

use std::collections::HashMap;
use std::path::PathBuf;

use powerbot_core::DataRoot;
use tracing::{info, warn};

use crate::error::{Result, SupervisorError};
use crate::persist::{self, PersistedState};
use crate::process::{self, RunningWorker};
use crate::types::{WorkerKind, WorkerState, WorkerStatus};

struct WorkerEntry {
    state: WorkerState,
    running: Option<RunningWorker>,
    last_exit_code: Option<i32>,
}

impl WorkerEntry {
    fn new() -> Self {
        Self {
            state: WorkerState::Down,
            running: None,
            last_exit_code: None,
        }
    }
}

pub struct Supervisor {
    state_path: PathBuf,
    persisted: PersistedState,
    workers: HashMap<WorkerKind, WorkerEntry>,
}

impl Supervisor {
    pub fn new(data_root: &DataRoot) -> Result<Self> {
        let state_path = data_root.supervisor_state_path();
        let persisted = persist::load(&state_path)?;
        let mut workers = HashMap::new();
        for kind in WorkerKind::all() {
            workers.insert(kind, WorkerEntry::new());
        }
        Ok(Self {
            state_path,
            persisted,
            workers,
        })
    }

    fn save(&self) -> Result<()> {
        persist::save(&self.state_path, &self.persisted)
    }

    /// Polls the running child's exit status without blocking, mirroring
    /// the original's `.poll()`-on-every-check pattern: a worker that died
    /// between two status/toggle calls is only ever noticed here, since
    /// nothing else watches it in the background (§1, §7).
    fn reap_if_exited(&mut self, kind: WorkerKind) {
        let entry = self.workers.get_mut(&kind).expect("all kinds present");
        if entry.state != WorkerState::Up {
            return;
        }
        let Some(running) = entry.running.as_mut() else { return };
        match running.child.try_wait() {
            Ok(Some(status)) => {
                warn!(worker = %kind, exit_code = ?status.code(), "worker crashed, marking down");
                entry.running = None;
                entry.state = WorkerState::Down;
                entry.last_exit_code = status.code();
                self.persisted.set_enabled(kind, false);
                if let Err(e) = self.save() {
                    warn!(worker = %kind, error = %e, "failed to persist crash state");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(worker = %kind, error = %e, "try_wait failed while polling worker liveness"),
        }
    }

    pub fn status(&mut self, kind: WorkerKind) -> WorkerStatus {
        self.reap_if_exited(kind);
        let entry = self.workers.get(&kind).expect("all kinds present");
        WorkerStatus {
            kind,
            state: entry.state,
            enabled_persisted: self.persisted.is_enabled(kind),
            autorun_persisted: self.persisted.is_autorun(kind),
            pid: entry.running.as_ref().and_then(|r| r.pid),
            last_exit_code: entry.last_exit_code,
        }
    }

    pub fn status_all(&mut self) -> Vec<WorkerStatus> {
        WorkerKind::all().iter().map(|k| self.status(*k)).collect()
    }

    /// Starts `kind` if it is not already up. On success the worker reaches
    /// `Up` and the persisted `enabled` flag is set to `true`. On failure it
    /// returns to `Down`, `last_exit_code` stays as previously recorded, and
    /// `enabled` is forced to `false`.
    pub async fn start(&mut self, kind: WorkerKind) -> Result<()> {
        {
            let entry = self.workers.get(&kind).expect("all kinds present");
            if entry.state != WorkerState::Down {
                return Err(SupervisorError::AlreadyRunning(kind.to_string()));
            }
        }

        self.workers.get_mut(&kind).unwrap().state = WorkerState::Starting;

        let outcome = process::start(kind, kind.binary_name()).await;
        let entry = self.workers.get_mut(&kind).unwrap();
        match outcome {
            Ok(running) => {
                entry.running = Some(running);
                entry.state = WorkerState::Up;
                self.persisted.set_enabled(kind, true);
                self.save()?;
                info!(worker = %kind, "worker is up");
                Ok(())
            }
            Err(e) => {
                entry.state = WorkerState::Down;
                self.persisted.set_enabled(kind, false);
                self.save()?;
                warn!(worker = %kind, error = %e, "worker failed to start, enabled flag cleared");
                Err(e)
            }
        }
    }

    /// Stops `kind` if it is running. Records the exit code and returns the
    /// worker to `Down`; persisted `enabled` is set to `false`.
    pub async fn stop(&mut self, kind: WorkerKind) -> Result<()> {
        let mut running = {
            let entry = self.workers.get_mut(&kind).expect("all kinds present");
            if entry.state == WorkerState::Down {
                return Err(SupervisorError::NotRunning(kind.to_string()));
            }
            entry
                .running
                .take()
                .ok_or_else(|| SupervisorError::NotRunning(kind.to_string()))?
        };

        let exit_code = process::stop(kind, &mut running).await?;

        let entry = self.workers.get_mut(&kind).unwrap();
        entry.state = WorkerState::Down;
        entry.last_exit_code = exit_code;
        self.persisted.set_enabled(kind, false);
        self.save()?;
        Ok(())
    }

    /// Starts `kind` if down, stops it if up. Returns the new `enabled`
    /// state on success.
    pub async fn toggle(&mut self, kind: WorkerKind) -> Result<bool> {
        self.reap_if_exited(kind);
        let is_down = self.workers.get(&kind).expect("all kinds present").state == WorkerState::Down;
        if is_down {
            self.start(kind).await?;
            Ok(true)
        } else {
            self.stop(kind).await?;
            Ok(false)
        }
    }

    /// Gets or sets the persisted autorun flag for `kind`. Passing `None`
    /// only reads the current value.
    pub fn autorun(&mut self, kind: WorkerKind, value: Option<bool>) -> Result<bool> {
        if let Some(v) = value {
            self.persisted.set_autorun(kind, v);
            self.save()?;
        }
        Ok(self.persisted.is_autorun(kind))
    }

    /// Called once at startup: starts every worker whose persisted autorun
    /// flag is set. A start failure is logged and does not abort the
    /// remaining workers.
    pub async fn run_startup_autorun(&mut self) -> Result<()> {
        for kind in WorkerKind::all() {
            if self.persisted.is_autorun(kind) {
                if let Err(e) = self.start(kind).await {
                    warn!(worker = %kind, error = %e, "autorun start failed");
                }
            }
        }
        Ok(())
    }
}
