//! Bounded queue of unsolicited messages.
//!
//! Plugins push messages here from any task (timers, background fetches);
//! the front-end drains the queue periodically through the bridge `pull`
//! operation. Pushing never blocks: when the queue is at capacity the push
//! fails with [`OutboxError::Full`].

use std::fmt;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::trace;

use crate::error::OutboxError;
use crate::message::Message;

/// The plugin host's outbox.
pub struct Outbox {
    tx: mpsc::Sender<Message>,
    rx: Mutex<mpsc::Receiver<Message>>,
    capacity: usize,
}

impl Outbox {
    /// Creates an outbox holding at most `capacity` messages.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Mutex::new(rx),
            capacity,
        }
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueues a message without waiting.
    pub fn push(&self, msg: Message) -> Result<(), OutboxError> {
        push(&self.tx, msg)
    }

    /// Returns every message queued at the time of the call, oldest first.
    ///
    /// Messages pushed concurrently are either included or left for the next
    /// pull; none are lost.
    pub fn pull(&self) -> Vec<Message> {
        let mut rx = self.rx.lock();
        let pending = rx.len();
        let mut out = Vec::with_capacity(pending);
        while out.len() < pending {
            match rx.try_recv() {
                Ok(msg) => out.push(msg),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if !out.is_empty() {
            trace!(count = out.len(), "Outbox drained");
        }
        out
    }

    /// Returns the number of queued messages.
    pub fn len(&self) -> usize {
        self.rx.lock().len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a cloneable handle for plugins.
    pub fn sender(&self) -> OutboxSender {
        OutboxSender {
            tx: self.tx.clone(),
        }
    }
}

impl fmt::Debug for Outbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outbox")
            .field("capacity", &self.capacity)
            .field("queued", &self.len())
            .finish()
    }
}

/// A handle plugins keep to push messages from background tasks.
#[derive(Debug, Clone)]
pub struct OutboxSender {
    tx: mpsc::Sender<Message>,
}

impl OutboxSender {
    /// Enqueues a message without waiting.
    pub fn push(&self, msg: Message) -> Result<(), OutboxError> {
        push(&self.tx, msg)
    }
}

fn push(tx: &mpsc::Sender<Message>, msg: Message) -> Result<(), OutboxError> {
    tx.try_send(msg).map_err(|e| match e {
        TrySendError::Full(_) => OutboxError::Full,
        TrySendError::Closed(_) => OutboxError::Closed,
    })
}
