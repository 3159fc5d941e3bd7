//! The external chat/video-platform contract (§1, §6 Non-goals — the
//! concrete Discord/YouTube clients are out of scope; only this interface
//! is implemented against). Stream Watcher and Chat Listener are both
//! generic over `P: PlatformClient` rather than depending on a concrete
//! client crate.

use async_trait::async_trait;
use thiserror::Error;

/// One live broadcast as reported by `list_active_broadcast`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBroadcast {
    pub video_id: String,
    pub title: String,
    pub url: String,
}

/// One inbound chat message as reported by `fetch_messages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub source_id: String,
    pub author_external_id: String,
    pub author_display_name: String,
    pub text: String,
    pub sent_at: String,
}

/// A page of `fetch_messages` results plus the server's suggested delay
/// (in milliseconds) before polling again, e.g. YouTube Live Chat's
/// `pollingIntervalMillis` (§4.6). `None` means the client has no opinion
/// and the caller's own configured `poll_interval_ms` applies unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchedMessages {
    pub messages: Vec<ChatMessage>,
    pub next_delay_ms: Option<u64>,
}

impl FetchedMessages {
    pub fn new(messages: Vec<ChatMessage>, next_delay_ms: Option<u64>) -> Self {
        Self { messages, next_delay_ms }
    }
}

#[derive(Debug, Error)]
#[error("platform client error: {0}")]
pub struct PlatformClientError(pub String);

impl PlatformClientError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Contract for whatever concrete Discord/YouTube SDK sits behind the bot.
/// Implementations are supplied by the caller; this crate only consumes it.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn list_active_broadcast(&self) -> Result<Option<ActiveBroadcast>, PlatformClientError>;

    async fn fetch_messages(
        &self,
        chat_id: &str,
        since: Option<&str>,
    ) -> Result<FetchedMessages, PlatformClientError>;

    async fn post_message(&self, chat_id: &str, text: &str) -> Result<(), PlatformClientError>;

    async fn get_channel_avatar(&self, channel_id: &str) -> Result<Option<String>, PlatformClientError>;
}
