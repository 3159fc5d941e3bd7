//! Chat Listener (§4.6): a long-poll pump over a `PlatformClient`, LRU-bounded
//! message-id dedup, and sequential handler fan-out. One pump per chat id;
//! the Supervisor starts/stops it in step with the Stream Watcher's
//! `changed` transitions.

pub mod dedup;
pub mod error;
pub mod handler;
pub mod pump;
pub mod types;

pub use error::{ChatListenerError, Result};
pub use handler::MessageHandler;
pub use pump::{start, ChatListenerHandle};
pub use types::{ListenerStats, ListenerState};
