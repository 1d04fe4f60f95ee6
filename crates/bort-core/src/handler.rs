//! Handler capability.
//!
//! A [`Handler`] turns one inbound [`Message`] into at most one outbound
//! message. Returning a message whose type is [`MessageType::NONE`] means "no
//! reply"; returning an error reports a failure to the dispatcher without
//! producing output.
//!
//! Async closures implement the trait directly:
//!
//! ```rust,ignore
//! registry.register_command("ping", "reply with pong", |msg: Message| async move {
//!     Ok(msg.reply("pong"))
//! })?;
//! ```
//!
//! [`MessageType::NONE`]: crate::MessageType::NONE

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::message::Message;

/// Result returned by handlers.
pub type HandlerResult = anyhow::Result<Message>;

/// Something that can answer a message.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handles `msg` and returns the reply.
    async fn handle(&self, msg: Message) -> HandlerResult;
}

/// Shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, msg: Message) -> HandlerResult {
        (self)(msg).await
    }
}

/// Boxes a handler for storage in a registry.
pub fn into_handler<H>(handler: H) -> BoxedHandler
where
    H: Handler + 'static,
{
    Arc::new(handler)
}
