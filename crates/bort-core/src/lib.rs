//! # Bort Core
//!
//! The message model and dispatch engine of the bort bot runtime.
//!
//! ## Overview
//!
//! - **Messages**: [`Message`] and the [`MessageType`] bitmask represent both
//!   inbound events and outbound replies.
//! - **Ingress**: [`Classifier`] turns a chat-wire [`RawEvent`] into a typed
//!   message and parses commands.
//! - **Registries**: plugins register commands, matchers and setup functions
//!   on a [`Registry`].
//! - **Dispatch**: [`Engine::process`] routes one message and returns a
//!   [`Dispatch`] with the replies.
//! - **Outbox**: plugins push unsolicited messages to the bounded [`Outbox`],
//!   which the front-end drains through [`Engine::pull`].
//!
//! ```text
//! RawEvent ──▶ Classifier ──▶ Engine ──▶ help | command | matchers ──▶ Dispatch
//!                               ▲
//!                   Outbox ─────┘ (pull)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bort_core::{Engine, Message, MessageType, Outbox, Registry};
//!
//! let registry = Arc::new(Registry::new());
//! registry.register_command("ping", "reply with pong", |msg: Message| async move {
//!     Ok(msg.reply("pong"))
//! })?;
//!
//! let engine = Engine::new(registry, Arc::new(Outbox::new(64)));
//! let dispatch = engine.process(incoming).await;
//! ```

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod ingress;
pub mod message;
pub mod outbox;
pub mod registry;
pub mod setup;

pub use dispatcher::{Dispatch, Engine, HELP_COMMAND};
pub use error::{
    DispatchError, MatcherFailure, OutboxError, RegistryError, RegistryResult, SetupError,
};
pub use handler::{BoxedHandler, Handler, HandlerResult, into_handler};
pub use ingress::{Classifier, RawEvent, is_channel};
pub use message::{Message, MessageType};
pub use outbox::{Outbox, OutboxSender};
pub use registry::{CommandEntry, Matcher, MatcherId, Registry};
pub use setup::{PluginConfig, SetupFn};
