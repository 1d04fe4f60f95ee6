//! Bort Runtime - process plumbing for the bort bot runtime.
//!
//! This crate provides:
//! - Configuration loading (`ConfigLoader`, `BortConfig`)
//! - Logging setup (`LoggingBuilder`)
//! - The plugin host (`PluginHost`) serving the dispatch engine over the bridge
//! - The front-end connection supervisor (`Supervisor`) and the chat wire
//!   abstraction it drives (`Wire`, `WireConnector`)
//!
//! ```ignore
//! use bort_runtime::{PluginHost, load_config, shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let host = PluginHost::from_config(&config);
//!     bort_plugins::register_all(host.registry(), host.outbox_sender());
//!     host.setup_from_config(&config);
//!     host.serve(&config.bridge.address, shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod output;
pub mod supervisor;
pub mod wire;

// Re-exports
pub use config::{BortConfig, ConfigError, ConfigLoader, ConfigResult, load_config};
pub use error::{RuntimeError, RuntimeResult, WireError};
pub use host::{PluginHost, shutdown_signal};
pub use logging::{LoggingBuilder, SpanEvents};
pub use supervisor::{Backoff, ConnectionState, Supervisor, SupervisorSettings};
pub use wire::{Wire, WireConnector, WireEvent, WireSession};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `instrument` attribute
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
