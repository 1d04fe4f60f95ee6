//! The chat wire seen by the connection supervisor.
//!
//! A [`WireConnector`] opens one connection to the chat network and returns
//! a [`WireSession`]: a [`Wire`] handle for sending and a stream of
//! [`WireEvent`]s. The session ends when the event stream yields
//! [`WireEvent::Disconnected`] or closes.

use std::sync::Arc;

use async_trait::async_trait;
use bort_core::RawEvent;
use tokio::sync::mpsc;

use crate::error::WireError;

/// Events delivered by a chat connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    /// Registration finished; the connection may join channels.
    Welcome,
    /// The bot itself joined `channel`.
    Joined { nick: String, channel: String },
    /// A protocol message to classify and route.
    Message(RawEvent),
    /// The connection ended.
    Disconnected(String),
}

/// Outbound operations on a chat connection.
#[async_trait]
pub trait Wire: Send + Sync {
    async fn join(&self, channel: &str) -> Result<(), WireError>;

    /// Sends one line of text to a channel or nick.
    async fn send_message(&self, target: &str, text: &str) -> Result<(), WireError>;

    /// Sends one line as an action (`/me`).
    async fn send_action(&self, target: &str, text: &str) -> Result<(), WireError>;
}

/// A live connection: the send handle and its event stream.
pub struct WireSession {
    pub wire: Arc<dyn Wire>,
    pub events: mpsc::Receiver<WireEvent>,
}

impl WireSession {
    pub fn new(wire: Arc<dyn Wire>, events: mpsc::Receiver<WireEvent>) -> Self {
        Self { wire, events }
    }
}

impl std::fmt::Debug for WireSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireSession").finish_non_exhaustive()
    }
}

/// Opens chat connections.
#[async_trait]
pub trait WireConnector: Send + Sync {
    async fn connect(&self) -> Result<WireSession, WireError>;
}
