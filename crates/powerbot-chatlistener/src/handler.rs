use async_trait::async_trait;
use powerbot_core::ChatMessage;

/// One registered handler in the pump's fan-out chain. Handlers run
/// sequentially in registration order (§4.6); a handler's error is logged
/// by the pump and never stops the chain or the pump itself.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &ChatMessage) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
