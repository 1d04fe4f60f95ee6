//! # Bort
//!
//! An IRC bot split into two processes so its plugins can be rebuilt and
//! restarted while the bot stays connected.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  IRC   ┌──────────────────────┐ bridge ┌──────────────────────────┐
//! │ IRC network  │◀──────▶│ bort (front-end)     │───────▶│ bortplug (plugin host)   │
//! └──────────────┘        │ Supervisor + wire    │ process│ Engine: help │ commands  │
//!                         │                      │ / pull │         │ matchers       │
//!                         └──────────────────────┘        │ Outbox ◀── plugin tasks  │
//!                                                         └──────────────────────────┘
//! ```
//!
//! - **Core** (`bort-core`): messages, registries, dispatch and the outbox
//! - **Transport** (`bort-transport`): the bridge protocol, server and client
//! - **Runtime** (`bort-runtime`): config, logging, the plugin host and the
//!   connection supervisor
//! - **Adapter** (`bort-adapter-irc`): the IRC client
//! - **Plugins** (`bort-plugins`): the built-in plugin set
//!
//! ## Writing a plugin
//!
//! ```rust,ignore
//! use bort::prelude::*;
//!
//! pub fn register(registry: &Registry, _outbox: OutboxSender) -> RegistryResult<()> {
//!     registry.register_command("ping", "reply with pong", |msg: Message| async move {
//!         Ok::<_, anyhow::Error>(msg.reply("pong"))
//!     })
//! }
//! ```

pub use bort_adapter_irc as irc;
pub use bort_core as core;
pub use bort_plugins as plugins;
pub use bort_runtime as runtime;
pub use bort_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use bort::prelude::*;
/// ```
pub mod prelude {
    // Message model and handlers
    pub use bort_core::{
        Handler, HandlerResult, Message, MessageType, OutboxSender, PluginConfig, Registry,
        RegistryResult,
    };

    // Processes
    pub use bort_adapter_irc::IrcConnector;
    pub use bort_runtime::{BortConfig, ConfigLoader, PluginHost, Supervisor, shutdown_signal};
}
