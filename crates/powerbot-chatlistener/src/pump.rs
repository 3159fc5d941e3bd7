use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use powerbot_core::PlatformClient;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::dedup::Dedup;
use crate::handler::MessageHandler;
use crate::types::{ListenerStats, ListenerState};

const DEDUP_CAPACITY: usize = 1024;

/// A running pump: holds the shutdown signal and the join handle so `stop()`
/// can cancel cleanly and wait for the in-flight iteration to finish.
pub struct ChatListenerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
    state: Arc<ListenerState>,
}

impl ChatListenerHandle {
    pub fn stats(&self) -> ListenerStats {
        self.state.snapshot()
    }

    /// Cancels the pump and waits for its current iteration to finish
    /// before returning.
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

/// Starts the long-poll pump as a background task against `client`,
/// invoking `handlers` sequentially in registration order for every fresh
/// message (deduplicated against the last `DEDUP_CAPACITY` ids seen).
pub fn start<P>(
    client: P,
    chat_id: String,
    handlers: Vec<Arc<dyn MessageHandler>>,
    poll_interval_ms: u64,
) -> ChatListenerHandle
where
    P: PlatformClient + 'static,
{
    let state = Arc::new(ListenerState::new(poll_interval_ms));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let client: Arc<dyn PlatformClient> = Arc::new(client);

    let join = tokio::spawn(run_pump(
        client,
        chat_id,
        handlers,
        poll_interval_ms,
        shutdown_rx,
        state.clone(),
    ));

    ChatListenerHandle {
        shutdown_tx,
        join: Some(join),
        state,
    }
}

async fn run_pump(
    client: Arc<dyn PlatformClient>,
    chat_id: String,
    handlers: Vec<Arc<dyn MessageHandler>>,
    poll_interval_ms: u64,
    mut shutdown: watch::Receiver<bool>,
    state: Arc<ListenerState>,
) {
    info!(chat_id, poll_interval_ms, "chat listener pump started");
    let mut dedup = Dedup::new(DEDUP_CAPACITY);
    let mut since: Option<String> = None;
    let mut next_tick_ms = poll_interval_ms.max(1);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(next_tick_ms)) => {
                match client.fetch_messages(&chat_id, since.as_deref()).await {
                    Ok(fetched) => {
                        for message in fetched.messages {
                            since = Some(message.source_id.clone());
                            if !dedup.insert_if_new(&message.source_id) {
                                continue;
                            }
                            for handler in &handlers {
                                if let Err(e) = handler.handle(&message).await {
                                    error!(error = %e, source_id = %message.source_id, "chat message handler failed");
                                }
                            }
                            state.processed_messages_count.fetch_add(1, Ordering::Relaxed);
                        }

                        // §4.6: the server's suggested delay wins, but never below
                        // the configured floor.
                        next_tick_ms = fetched.next_delay_ms.unwrap_or(poll_interval_ms).max(poll_interval_ms).max(1);
                    }
                    Err(e) => {
                        error!(error = %e, chat_id, "fetch_messages failed");
                        next_tick_ms = poll_interval_ms.max(1);
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!(chat_id, "chat listener pump stopping");
                    break;
                }
            }
        }
    }
    state.is_running.store(false, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use powerbot_core::{ActiveBroadcast, ChatMessage, FetchedMessages, PlatformClientError};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct FakeClient {
        messages: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl PlatformClient for FakeClient {
        async fn list_active_broadcast(&self) -> Result<Option<ActiveBroadcast>, PlatformClientError> {
            Ok(None)
        }
        async fn fetch_messages(
            &self,
            _chat_id: &str,
            _since: Option<&str>,
        ) -> Result<FetchedMessages, PlatformClientError> {
            Ok(FetchedMessages::new(std::mem::take(&mut self.messages.lock().unwrap()), None))
        }
        async fn post_message(&self, _chat_id: &str, _text: &str) -> Result<(), PlatformClientError> {
            Ok(())
        }
        async fn get_channel_avatar(&self, _channel_id: &str) -> Result<Option<String>, PlatformClientError> {
            Ok(None)
        }
    }

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MessageHandler for CountingHandler {
        async fn handle(&self, _message: &ChatMessage) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn message(id: &str) -> ChatMessage {
        ChatMessage {
            source_id: id.to_string(),
            author_external_id: "user-1".to_string(),
            author_display_name: "Viewer".to_string(),
            text: "hello".to_string(),
            sent_at: "2026-07-28T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn processes_each_fresh_message_once_and_stops_cleanly() {
        let count = Arc::new(AtomicUsize::new(0));
        let client = FakeClient {
            messages: Mutex::new(vec![message("m1"), message("m2")]),
        };
        let handler: Arc<dyn MessageHandler> = Arc::new(CountingHandler { count: count.clone() });

        let handle = start(client, "chat-1".to_string(), vec![handler], 10);
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop().await;

        assert_eq!(count.load(Ordering::Relaxed), 2);
    }
}
