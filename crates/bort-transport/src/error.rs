//! Bridge error types.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by the bridge client and server.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Dialing the plugin host failed.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Reading or writing a frame failed.
    #[error("bridge I/O error: {0}")]
    Io(#[from] io::Error),

    /// The peer closed the connection.
    #[error("bridge connection closed")]
    Closed,

    /// The call did not complete in time.
    #[error("bridge call timed out after {0:?}")]
    Timeout(Duration),

    /// A frame did not contain a valid protocol document.
    #[error("bridge codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The plugin host rejected the request.
    #[error("plugin host rejected request: {0}")]
    Remote(String),

    /// The response does not answer the request.
    #[error("unexpected response '{got}', expected '{expected}'")]
    UnexpectedResponse {
        expected: &'static str,
        got: &'static str,
    },
}

impl BridgeError {
    /// Returns `true` if the connection is unusable after this error.
    ///
    /// The client drops its connection on transport errors and dials again
    /// on the next call.
    pub fn is_transport(&self) -> bool {
        !matches!(self, BridgeError::Remote(_))
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(BridgeError::Closed.is_transport());
        assert!(BridgeError::Timeout(Duration::from_secs(1)).is_transport());
        assert!(BridgeError::Io(io::Error::from(io::ErrorKind::BrokenPipe)).is_transport());
        assert!(!BridgeError::Remote("bad request".into()).is_transport());
    }
}
