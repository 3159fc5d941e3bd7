use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Shared counters read by `ChatListenerHandle::stats()` while the pump
/// task owns the write side.
pub struct ListenerState {
    pub processed_messages_count: AtomicU64,
    pub is_running: AtomicBool,
    pub poll_interval_ms: u64,
}

impl ListenerState {
    pub fn new(poll_interval_ms: u64) -> Self {
        Self {
            processed_messages_count: AtomicU64::new(0),
            is_running: AtomicBool::new(true),
            poll_interval_ms,
        }
    }

    pub fn snapshot(&self) -> ListenerStats {
        ListenerStats {
            processed_messages_count: self.processed_messages_count.load(Ordering::Relaxed),
            poll_interval_ms: self.poll_interval_ms,
            is_running: self.is_running.load(Ordering::Relaxed),
        }
    }
}

/// `stats()` snapshot (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerStats {
    pub processed_messages_count: u64,
    pub poll_interval_ms: u64,
    pub is_running: bool,
}
