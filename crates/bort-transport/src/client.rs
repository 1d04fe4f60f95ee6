//! Lazily reconnecting bridge client.
//!
//! The front-end holds one [`BridgeClient`] for its whole lifetime. The
//! connection is dialed on first use and dropped after any transport
//! failure; the next call dials again. This keeps the front-end running
//! while the plugin host is stopped, rebuilt and restarted.

use std::time::Duration;

use async_trait::async_trait;
use bort_core::Message;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::protocol::{self, ProcessReply, Request, Response};

/// Default bound on a single bridge call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens byte streams to the plugin host.
#[async_trait]
pub trait Dialer: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn dial(&self) -> BridgeResult<Self::Stream>;
}

/// Dials the plugin host over TCP.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    address: String,
}

impl TcpDialer {
    /// An address with an empty host (`":1234"`) dials the local machine.
    pub fn new(address: impl AsRef<str>) -> Self {
        Self {
            address: crate::with_default_host(address.as_ref(), "127.0.0.1").into_owned(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self) -> BridgeResult<TcpStream> {
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|source| BridgeError::Connect {
                address: self.address.clone(),
                source,
            })?;
        let _ = stream.set_nodelay(true);
        Ok(stream)
    }
}

type Connection<S> = Framed<S, LengthDelimitedCodec>;

/// Client side of the bridge.
///
/// Calls are serialized: one request is in flight at a time.
pub struct BridgeClient<D: Dialer = TcpDialer> {
    dialer: D,
    timeout: Duration,
    conn: Mutex<Option<Connection<D::Stream>>>,
}

impl BridgeClient<TcpDialer> {
    /// Creates a client for the plugin host at `address`.
    pub fn tcp(address: impl AsRef<str>, timeout: Duration) -> Self {
        Self::new(TcpDialer::new(address), timeout)
    }
}

impl<D: Dialer> BridgeClient<D> {
    /// Creates a client that dials through `dialer`. Nothing is dialed yet.
    pub fn new(dialer: D, timeout: Duration) -> Self {
        Self {
            dialer,
            timeout,
            conn: Mutex::new(None),
        }
    }

    /// Returns the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns `true` if a connection is currently open.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Drops the current connection, if any. The next call dials again.
    pub async fn reset(&self) {
        if self.conn.lock().await.take().is_some() {
            debug!("Bridge connection reset");
        }
    }

    /// Sends one inbound message to the plugin host for dispatch.
    pub async fn process(&self, message: Message) -> BridgeResult<ProcessReply> {
        match self.call(Request::Process { message }).await? {
            Response::Processed { replies, error } => Ok(ProcessReply { replies, error }),
            other => Err(unexpected("processed", &other)),
        }
    }

    /// Drains the plugin host's outbox.
    pub async fn pull(&self) -> BridgeResult<Vec<Message>> {
        match self.call(Request::Pull).await? {
            Response::Pulled { messages } => Ok(messages),
            other => Err(unexpected("pulled", &other)),
        }
    }

    async fn call(&self, request: Request) -> BridgeResult<Response> {
        let mut conn = self.conn.lock().await;

        let exchange = self.exchange(&mut conn, &request);
        let result = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout(self.timeout)),
        };

        match result {
            Ok(Response::Failed { reason }) => Err(BridgeError::Remote(reason)),
            Ok(response) => Ok(response),
            Err(e) => {
                if e.is_transport() && conn.take().is_some() {
                    warn!(error = %e, "Bridge connection lost");
                }
                Err(e)
            }
        }
    }

    async fn exchange(
        &self,
        conn: &mut Option<Connection<D::Stream>>,
        request: &Request,
    ) -> BridgeResult<Response> {
        if conn.is_none() {
            let stream = self.dialer.dial().await?;
            *conn = Some(Framed::new(stream, protocol::frame_codec()));
            info!("Connected to plugin host");
        }
        let Some(framed) = conn.as_mut() else {
            return Err(BridgeError::Closed);
        };

        framed.send(protocol::encode(request)?).await?;
        match framed.next().await {
            Some(frame) => protocol::decode(&frame?),
            None => Err(BridgeError::Closed),
        }
    }
}

fn unexpected(expected: &'static str, got: &Response) -> BridgeError {
    BridgeError::UnexpectedResponse {
        expected,
        got: got.op(),
    }
}

impl<D: Dialer + std::fmt::Debug> std::fmt::Debug for BridgeClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("dialer", &self.dialer)
            .field("timeout", &self.timeout)
            .finish()
    }
}
