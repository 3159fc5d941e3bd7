//! Supervisor & Console (§4.7): owns the lifecycle of the fixed worker set
//! (`web`, `chat_bot`, `chat_watcher`, `backup`, `websocket_hub`), persists
//! each worker's `enabled`/`autorun` flags across restarts, and exposes a
//! REPL for manual control.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use powerbot_core::DataRoot;
//! use powerbot_supervisor::{Supervisor, WorkerKind};
//!
//! #[tokio::main]
//! async fn main() {
//!     let root = DataRoot::resolve();
//!     let mut supervisor = Supervisor::new(&root).unwrap();
//!     supervisor.run_startup_autorun().await.unwrap();
//!     supervisor.start(WorkerKind::Web).await.unwrap();
//! }
//! ```

pub mod console;
pub mod error;
pub mod logtail;
pub mod persist;
pub mod process;
pub mod supervisor;
pub mod types;

pub use error::{Result, SupervisorError};
pub use supervisor::Supervisor;
pub use types::{WorkerKind, WorkerState, WorkerStatus};
