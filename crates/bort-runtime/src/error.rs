//! Runtime error types.

use std::io;

use bort_transport::BridgeError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while running either process.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The bridge listener could not be bound.
    #[error("Failed to bind bridge address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: BridgeError,
    },

    /// Bridge failure outside of a session.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Chat wire failure.
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),
}

/// Errors raised by a chat wire implementation.
#[derive(Error, Debug)]
pub enum WireError {
    /// The chat server could not be reached.
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Reading from or writing to the connection failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server sent something the client cannot handle.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The connection was closed, with the reason given by the server.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// The connection is no longer usable.
    #[error("Connection closed")]
    Closed,
}

impl WireError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
