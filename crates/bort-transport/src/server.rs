//! Single-tenant bridge server.
//!
//! The plugin host binds one address and serves one front-end at a time:
//! an accepted session runs to completion (the peer disconnects) before the
//! next connection is accepted. Later connections wait in the listen backlog.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::error::BridgeResult;
use crate::protocol::{self, Request, Response};
use crate::service::BridgeService;

/// Pause after a failed `accept`, so a persistent failure does not spin.
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Listens for front-end connections and serves them one at a time.
pub struct BridgeServer<S: ?Sized> {
    listener: TcpListener,
    service: Arc<S>,
}

impl<S> BridgeServer<S>
where
    S: BridgeService + ?Sized,
{
    /// Binds `address`.
    ///
    /// An address with an empty host (`":1234"`) listens on all interfaces.
    pub async fn bind(address: &str, service: Arc<S>) -> BridgeResult<Self> {
        let address = crate::with_default_host(address, "0.0.0.0");
        let listener = TcpListener::bind(&*address).await?;
        info!(addr = %listener.local_addr()?, "Bridge listening");
        Ok(Self::from_listener(listener, service))
    }

    /// Serves on an already bound listener.
    pub fn from_listener(listener: TcpListener, service: Arc<S>) -> Self {
        Self { listener, service }
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> BridgeResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until the process exits.
    pub async fn run(self) -> BridgeResult<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves.
    ///
    /// A session in progress when `shutdown` fires is dropped.
    pub async fn run_until<F>(self, shutdown: F) -> BridgeResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept bridge connection");
                        if sleep_or_shutdown(ACCEPT_RETRY_DELAY, &mut shutdown).await {
                            break;
                        }
                        continue;
                    }
                },
            };

            let _ = stream.set_nodelay(true);
            info!(peer = %peer, "Bridge session started");

            tokio::select! {
                _ = &mut shutdown => break,
                result = serve_connection(stream, &*self.service) => match result {
                    Ok(()) => info!(peer = %peer, "Bridge session ended"),
                    Err(e) => warn!(peer = %peer, error = %e, "Bridge session failed"),
                },
            }
        }

        info!("Bridge server stopped");
        Ok(())
    }
}

/// Sleeps for `delay`. Returns `true` if `shutdown` fired first.
async fn sleep_or_shutdown<F>(delay: Duration, shutdown: &mut F) -> bool
where
    F: Future<Output = ()> + Unpin,
{
    tokio::select! {
        _ = shutdown => true,
        _ = tokio::time::sleep(delay) => false,
    }
}

/// Serves one bridge session over `io` until the peer closes it.
///
/// Undecodable requests are answered with a `failed` response and the
/// session continues; framing or I/O errors end it.
pub async fn serve_connection<T, S>(io: T, service: &S) -> BridgeResult<()>
where
    T: AsyncRead + AsyncWrite + Unpin,
    S: BridgeService + ?Sized,
{
    let mut framed = Framed::new(io, protocol::frame_codec());

    while let Some(frame) = framed.next().await {
        let frame = frame?;
        let response = match protocol::decode::<Request>(&frame) {
            Ok(Request::Process { message }) => {
                debug!(kind = %message.kind, context = %message.context, "Process request");
                Response::from(service.process(message).await)
            }
            Ok(Request::Pull) => Response::Pulled {
                messages: service.pull().await,
            },
            Err(e) => {
                warn!(error = %e, "Rejected malformed bridge request");
                Response::Failed {
                    reason: e.to_string(),
                }
            }
        };
        framed.send(protocol::encode(&response)?).await?;
    }

    Ok(())
}

impl<S: ?Sized> std::fmt::Debug for BridgeServer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeServer")
            .field("local_addr", &self.listener.local_addr().ok())
            .finish()
    }
}
