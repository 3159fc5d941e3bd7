use std::path::PathBuf;

use powerbot_core::PlatformClient;
use tracing::error;

use crate::error::Result;
use crate::store;
use crate::types::{DetectOutcome, StreamState};

/// Detects upstream live-broadcast transitions and persists the last-known
/// state to `state_path`, so other workers can read it without hitting the
/// platform API themselves.
pub struct StreamWatcher<P: PlatformClient> {
    client: P,
    state_path: PathBuf,
    state: StreamState,
}

impl<P: PlatformClient> StreamWatcher<P> {
    pub fn new(client: P, state_path: PathBuf) -> Result<Self> {
        let state = store::load(&state_path)?;
        Ok(Self {
            client,
            state_path,
            state,
        })
    }

    pub fn current(&self) -> &StreamState {
        &self.state
    }

    pub fn is_live(&self) -> bool {
        self.state.is_live
    }

    /// One remote call, then the transition table from §4.5. On a client
    /// error the last-known state is kept (only `last_checked` advances) and
    /// `changed` is reported `false` — errors are logged, not propagated, so
    /// a flaky upstream never corrupts the cached state.
    pub async fn detect(&mut self) -> Result<DetectOutcome> {
        let now = powerbot_core::now_rfc3339();

        let broadcast = match self.client.list_active_broadcast().await {
            Ok(b) => b,
            Err(e) => {
                error!(error = %e, "stream detection call failed");
                self.state.last_checked = Some(now);
                store::save(&self.state_path, &self.state)?;
                return Ok(DetectOutcome {
                    state: self.state.clone(),
                    changed: false,
                });
            }
        };

        let changed = match (&broadcast, self.state.is_live, &self.state.video_id) {
            (None, was_live, _) => was_live,
            (Some(b), false, _) => {
                let _ = b;
                true
            }
            (Some(b), true, prev_id) => prev_id.as_deref() != Some(b.video_id.as_str()),
        };

        match broadcast {
            None => {
                self.state.is_live = false;
                self.state.video_id = None;
                self.state.title = None;
                self.state.url = None;
            }
            Some(b) => {
                self.state.is_live = true;
                self.state.video_id = Some(b.video_id);
                self.state.title = Some(b.title);
                self.state.url = Some(b.url);
            }
        }
        self.state.last_checked = Some(now.clone());
        if changed {
            self.state.last_status_change = Some(now);
        }

        store::save(&self.state_path, &self.state)?;
        Ok(DetectOutcome {
            state: self.state.clone(),
            changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use powerbot_core::{ActiveBroadcast, FetchedMessages, PlatformClientError};
    use std::sync::Mutex;

    struct FakeClient {
        next: Mutex<Option<ActiveBroadcast>>,
    }

    #[async_trait]
    impl PlatformClient for FakeClient {
        async fn list_active_broadcast(&self) -> std::result::Result<Option<ActiveBroadcast>, PlatformClientError> {
            Ok(self.next.lock().unwrap().clone())
        }
        async fn fetch_messages(
            &self,
            _chat_id: &str,
            _since: Option<&str>,
        ) -> std::result::Result<FetchedMessages, PlatformClientError> {
            Ok(FetchedMessages::default())
        }
        async fn post_message(&self, _chat_id: &str, _text: &str) -> std::result::Result<(), PlatformClientError> {
            Ok(())
        }
        async fn get_channel_avatar(&self, _channel_id: &str) -> std::result::Result<Option<String>, PlatformClientError> {
            Ok(None)
        }
    }

    fn tmp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("powerbot-streamwatch-test-{name}-{}.json", std::process::id()))
    }

    #[tokio::test]
    async fn offline_to_live_reports_changed() {
        let path = tmp_path("offline-to-live");
        let client = FakeClient {
            next: Mutex::new(Some(ActiveBroadcast {
                video_id: "abc".to_string(),
                title: "Live now".to_string(),
                url: "https://youtube.com/watch?v=abc".to_string(),
            })),
        };
        let mut watcher = StreamWatcher::new(client, path.clone()).unwrap();
        let outcome = watcher.detect().await.unwrap();
        assert!(outcome.changed);
        assert!(outcome.state.is_live);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn same_video_id_is_not_a_change() {
        let path = tmp_path("same-video");
        let client = FakeClient {
            next: Mutex::new(Some(ActiveBroadcast {
                video_id: "abc".to_string(),
                title: "Live now".to_string(),
                url: "https://youtube.com/watch?v=abc".to_string(),
            })),
        };
        let mut watcher = StreamWatcher::new(client, path.clone()).unwrap();
        let first = watcher.detect().await.unwrap();
        assert!(first.changed);
        let second = watcher.detect().await.unwrap();
        assert!(!second.changed);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn live_to_offline_reports_changed() {
        let path = tmp_path("live-to-offline");
        let client = FakeClient {
            next: Mutex::new(Some(ActiveBroadcast {
                video_id: "abc".to_string(),
                title: "Live now".to_string(),
                url: "https://youtube.com/watch?v=abc".to_string(),
            })),
        };
        let mut watcher = StreamWatcher::new(client, path.clone()).unwrap();
        watcher.detect().await.unwrap();
        *watcher.client.next.lock().unwrap() = None;
        let outcome = watcher.detect().await.unwrap();
        assert!(outcome.changed);
        assert!(!outcome.state.is_live);
        let _ = std::fs::remove_file(&path);
    }
}
