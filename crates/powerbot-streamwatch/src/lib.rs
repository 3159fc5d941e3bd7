//! Stream Watcher (§4.5): a single-row, disk-persisted cache of the
//! upstream broadcast state, refreshed by one `PlatformClient` call per
//! `detect()`. `changed=true` is the signal downstream consumers (the
//! Supervisor, starting/stopping the Chat Listener; the progress notifier)
//! key off of.

pub mod error;
pub mod store;
pub mod types;
pub mod watcher;

pub use error::{Result, StreamWatchError};
pub use types::{DetectOutcome, StreamState};
pub use watcher::StreamWatcher;
