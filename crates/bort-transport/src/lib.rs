//! # Bort Transport
//!
//! The bridge between the `bort` front-end and the `bortplug` plugin host.
//!
//! ```text
//! ┌──────────────┐  process / pull   ┌──────────────┐
//! │ BridgeClient │ ────────────────▶ │ BridgeServer │──▶ BridgeService (Engine)
//! │  (front-end) │ ◀──────────────── │ (plugin host)│
//! └──────────────┘  replies / queue  └──────────────┘
//! ```
//!
//! - [`protocol`]: length-delimited JSON frames and the request/response
//!   documents.
//! - [`BridgeService`]: what the plugin host serves; implemented for
//!   [`bort_core::Engine`].
//! - [`BridgeServer`]: single-tenant accept loop; [`serve_connection`] runs
//!   one session over any byte stream.
//! - [`BridgeClient`]: lazily dialing client with a per-call timeout.

use std::borrow::Cow;

pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod service;

pub use client::{BridgeClient, DEFAULT_TIMEOUT, Dialer, TcpDialer};
pub use error::{BridgeError, BridgeResult};
pub use protocol::{ProcessReply, Request, Response};
pub use server::{BridgeServer, serve_connection};
pub use service::BridgeService;

/// Fills in `host` when `address` has the form `":port"`.
pub(crate) fn with_default_host<'a>(address: &'a str, host: &str) -> Cow<'a, str> {
    if address.starts_with(':') {
        Cow::Owned(format!("{host}{address}"))
    } else {
        Cow::Borrowed(address)
    }
}
