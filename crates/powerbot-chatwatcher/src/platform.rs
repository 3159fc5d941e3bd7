use async_trait::async_trait;
use powerbot_core::{ActiveBroadcast, FetchedMessages, PlatformClient, PlatformClientError};

/// Placeholder `PlatformClient`: the seam a concrete Discord/YouTube
/// broadcast-detection SDK plugs into (out of scope, §1). Always reports
/// offline so the watcher idles cleanly rather than erroring when no real
/// adapter is configured.
pub struct UnconfiguredPlatformClient {
    pub platform: String,
}

#[async_trait]
impl PlatformClient for UnconfiguredPlatformClient {
    async fn list_active_broadcast(&self) -> Result<Option<ActiveBroadcast>, PlatformClientError> {
        Ok(None)
    }

    async fn fetch_messages(
        &self,
        _chat_id: &str,
        _since: Option<&str>,
    ) -> Result<FetchedMessages, PlatformClientError> {
        Ok(FetchedMessages::default())
    }

    async fn post_message(&self, _chat_id: &str, _text: &str) -> Result<(), PlatformClientError> {
        Err(PlatformClientError::new(format!(
            "no platform client configured for {}",
            self.platform
        )))
    }

    async fn get_channel_avatar(&self, _channel_id: &str) -> Result<Option<String>, PlatformClientError> {
        Ok(None)
    }
}
