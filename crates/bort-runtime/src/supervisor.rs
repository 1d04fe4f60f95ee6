//! Front-end connection supervisor.
//!
//! Owns the chat connection and feeds it through the bridge:
//!
//! ```text
//! Connecting ──connect ok──▶ Joining ──own JOIN──▶ Live
//!     ▲                                              │
//!     └──────────── disconnect / error ──────────────┘
//! ```
//!
//! While `Live`, inbound events are classified and sent to the plugin host,
//! and a poll task pulls pushed messages on a fixed interval. Both write to
//! the chat under one lock, so a reply batch is never interleaved with a
//! pull batch. The bridge reconnects on its own; the supervisor only ever
//! reconnects the chat side.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bort_core::{Classifier, Message};
use bort_transport::{BridgeClient, Dialer, TcpDialer};
use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::config::BortConfig;
use crate::error::WireError;
use crate::output;
use crate::wire::{Wire, WireConnector, WireEvent, WireSession};

/// Connection state of the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Dialing the chat server, or waiting to redial.
    Connecting,
    /// Connected; waiting for the channel join to complete.
    Joining,
    /// In the channel; events are dispatched and pushes polled.
    Live,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Joining => "joining",
            Self::Live => "live",
        })
    }
}

// =============================================================================
// Backoff
// =============================================================================

/// Delay between reconnect attempts.
///
/// Grows by `multiplier` after each failure up to `max`; with `max` equal to
/// `initial` the delay is fixed.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: u32,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            multiplier: 2,
            current: initial,
        }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, delay)
    }

    /// Returns the delay before the next attempt and advances.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = std::cmp::min(self.current * self.multiplier, self.max);
        delay
    }

    /// Back to the initial delay after a successful session.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

// =============================================================================
// Supervisor
// =============================================================================

/// Front-end settings used by the supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub channel: String,
    pub prefix: String,
    pub poll_interval: Duration,
    pub reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
}

impl SupervisorSettings {
    pub fn from_config(config: &BortConfig) -> Self {
        Self {
            channel: config.irc.channel.clone(),
            prefix: config.irc.prefix.clone(),
            poll_interval: config.bridge.poll_interval(),
            reconnect_delay: config.supervisor.reconnect_delay(),
            max_reconnect_delay: config.supervisor.max_reconnect_delay(),
        }
    }
}

/// Drives the chat connection and the bridge.
pub struct Supervisor<C, D: Dialer = TcpDialer> {
    connector: C,
    bridge: Arc<BridgeClient<D>>,
    classifier: Classifier,
    channel: String,
    poll_interval: Duration,
    backoff: SyncMutex<Backoff>,
    state: watch::Sender<ConnectionState>,
}

impl<C> Supervisor<C, TcpDialer>
where
    C: WireConnector,
{
    /// Builds a supervisor that dials the plugin host over TCP.
    pub fn from_config(connector: C, config: &BortConfig) -> Self {
        let bridge = BridgeClient::tcp(&config.bridge.address, config.bridge.timeout());
        Self::new(connector, Arc::new(bridge), SupervisorSettings::from_config(config))
    }
}

impl<C, D> Supervisor<C, D>
where
    C: WireConnector,
    D: Dialer + 'static,
{
    pub fn new(connector: C, bridge: Arc<BridgeClient<D>>, settings: SupervisorSettings) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        Self {
            connector,
            bridge,
            classifier: Classifier::new(settings.prefix),
            channel: settings.channel,
            poll_interval: settings.poll_interval,
            backoff: SyncMutex::new(Backoff::new(
                settings.reconnect_delay,
                settings.max_reconnect_delay,
            )),
            state,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Keeps the chat connection up forever.
    pub async fn run(&self) {
        self.run_until(std::future::pending()).await
    }

    /// Keeps the chat connection up until `shutdown` resolves.
    ///
    /// Connect failures and disconnects are retried after the backoff delay,
    /// indefinitely.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                result = self.run_session() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Chat connection lost");
                    }
                }
            }

            self.set_state(ConnectionState::Connecting);
            let delay = self.next_delay();
            info!(delay_ms = delay.as_millis() as u64, "Reconnecting to chat server");

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.set_state(ConnectionState::Connecting);
        info!("Supervisor stopped");
    }

    /// Runs one connect sequence until the connection ends.
    ///
    /// Always returns an error describing why the session ended.
    pub async fn run_session(&self) -> Result<(), WireError> {
        self.set_state(ConnectionState::Connecting);
        let WireSession { wire, mut events } = self.connector.connect().await?;
        self.set_state(ConnectionState::Joining);

        let writer = Arc::new(Mutex::new(()));
        let mut poller: Option<PollTask> = None;

        while let Some(event) = events.recv().await {
            match event {
                WireEvent::Welcome => {
                    info!(channel = %self.channel, "Registered, joining channel");
                    wire.join(&self.channel).await?;
                }
                WireEvent::Joined { nick, channel } => {
                    if !channel.eq_ignore_ascii_case(&self.channel) {
                        debug!(channel = %channel, "Joined unexpected channel");
                        continue;
                    }
                    if poller.is_some() {
                        continue;
                    }
                    info!(nick = %nick, channel = %channel, "Joined channel");
                    self.bridge.reset().await;
                    self.reset_backoff();
                    poller = Some(PollTask::spawn(
                        Arc::clone(&self.bridge),
                        Arc::clone(&wire),
                        Arc::clone(&writer),
                        self.poll_interval,
                    ));
                    self.set_state(ConnectionState::Live);
                }
                WireEvent::Message(raw) => {
                    if self.state() != ConnectionState::Live {
                        trace!(verb = %raw.verb, "Ignoring event before join");
                        continue;
                    }
                    let Some(msg) = self.classifier.classify(&raw) else {
                        continue;
                    };
                    let _guard = writer.lock().await;
                    self.handle(&*wire, msg).await;
                }
                WireEvent::Disconnected(reason) => {
                    return Err(WireError::Disconnected(reason));
                }
            }
        }

        Err(WireError::Closed)
    }

    async fn handle(&self, wire: &dyn Wire, msg: Message) {
        let reply = match self.bridge.process(msg).await {
            Ok(reply) => reply,
            Err(e) if e.is_transport() => {
                warn!(error = %e, "Plugin host unavailable");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Plugin host rejected message");
                return;
            }
        };

        if let Some(error) = &reply.error {
            for line in error.lines() {
                warn!(error = %line, "Plugin handler failed");
            }
        }
        for out in &reply.replies {
            if let Err(e) = output::deliver(wire, out).await {
                warn!(error = %e, "Failed to send reply");
                return;
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, state = %state, "Connection state changed");
        }
    }

    fn next_delay(&self) -> Duration {
        self.backoff.lock().next_delay()
    }

    fn reset_backoff(&self) {
        self.backoff.lock().reset();
    }
}

impl<C, D: Dialer> fmt::Debug for Supervisor<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("channel", &self.channel)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Pull polling
// =============================================================================

/// The pull-poll task of one live session. Aborted when dropped.
struct PollTask(JoinHandle<()>);

impl PollTask {
    fn spawn<D>(
        bridge: Arc<BridgeClient<D>>,
        wire: Arc<dyn Wire>,
        writer: Arc<Mutex<()>>,
        period: Duration,
    ) -> Self
    where
        D: Dialer + 'static,
    {
        PollTask(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let _guard = writer.lock().await;
                match bridge.pull().await {
                    Ok(messages) => {
                        for msg in &messages {
                            if let Err(e) = output::deliver(&*wire, msg).await {
                                warn!(error = %e, "Failed to send pushed message");
                                break;
                            }
                        }
                    }
                    Err(e) => debug!(error = %e, "Pull failed"),
                }
            }
        }))
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}
