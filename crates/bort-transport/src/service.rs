//! The service contract the plugin host exposes over the bridge.

use std::sync::Arc;

use async_trait::async_trait;
use bort_core::{Dispatch, Engine, Message};

/// Operations served to the front-end.
#[async_trait]
pub trait BridgeService: Send + Sync {
    /// Dispatches one inbound message.
    async fn process(&self, msg: Message) -> Dispatch;

    /// Drains queued push messages.
    async fn pull(&self) -> Vec<Message>;
}

#[async_trait]
impl BridgeService for Engine {
    async fn process(&self, msg: Message) -> Dispatch {
        Engine::process(self, msg).await
    }

    async fn pull(&self) -> Vec<Message> {
        Engine::pull(self)
    }
}

#[async_trait]
impl<S> BridgeService for Arc<S>
where
    S: BridgeService + ?Sized,
{
    async fn process(&self, msg: Message) -> Dispatch {
        (**self).process(msg).await
    }

    async fn pull(&self) -> Vec<Message> {
        (**self).pull().await
    }
}
