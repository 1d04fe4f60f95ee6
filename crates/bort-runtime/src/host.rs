//! The plugin host process.
//!
//! [`PluginHost`] owns the registry and the dispatch engine, runs plugin
//! setup once, and serves the engine to the front-end over the bridge.

use std::future::Future;
use std::sync::Arc;

use bort_core::{Engine, Outbox, OutboxSender, PluginConfig, Registry, SetupError};
use bort_transport::BridgeServer;
use serde_json::Value;
use tokio::signal;
use tracing::{error, info};

use crate::config::BortConfig;
use crate::error::{RuntimeError, RuntimeResult};

/// Registry, outbox and engine of one plugin host.
#[derive(Debug, Clone)]
pub struct PluginHost {
    registry: Arc<Registry>,
    engine: Engine,
}

impl PluginHost {
    /// Creates a host with an empty registry and an outbox of `capacity`.
    pub fn new(outbox_capacity: usize) -> Self {
        let registry = Arc::new(Registry::new());
        let engine = Engine::new(Arc::clone(&registry), Arc::new(Outbox::new(outbox_capacity)));
        Self { registry, engine }
    }

    pub fn from_config(config: &BortConfig) -> Self {
        Self::new(config.host.outbox_capacity)
    }

    /// The registry plugins register on.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// A handle for pushing unsolicited messages.
    pub fn outbox_sender(&self) -> OutboxSender {
        self.engine.outbox().sender()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Runs the queued plugin setup functions against `config`.
    ///
    /// Failures are returned; the host keeps serving with the plugins that
    /// did set up.
    pub fn setup(&self, config: &PluginConfig) -> Vec<SetupError> {
        self.registry.run_setup(config)
    }

    /// Runs setup with the `[plugins]` table of `config`.
    pub fn setup_from_config(&self, config: &BortConfig) -> Vec<SetupError> {
        self.setup(&PluginConfig::new(Value::Object(config.plugins.clone())))
    }

    /// Binds the bridge at `address` and serves until `shutdown` resolves.
    pub async fn serve<F>(&self, address: &str, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let server = BridgeServer::bind(address, Arc::new(self.engine.clone()))
            .await
            .map_err(|source| RuntimeError::Bind {
                address: address.to_string(),
                source,
            })?;
        server.run_until(shutdown).await?;
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = ctrl_c() => {}
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
