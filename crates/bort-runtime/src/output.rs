//! Turning replies into chat lines.
//!
//! Chat lines cannot contain line breaks, so a multi-line `PRIV_MSG` reply
//! becomes one line per non-empty text line. An `ACTION` is a single line;
//! only the first line of its text is sent.

use bort_core::{Message, MessageType};
use tracing::{trace, warn};

use crate::error::WireError;
use crate::wire::Wire;

/// One line to write to the chat wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Message { target: String, text: String },
    Action { target: String, text: String },
}

/// Renders a reply into the lines to send, in order.
pub fn render(msg: &Message) -> Vec<Line> {
    if msg.kind.is_none() {
        return Vec::new();
    }
    if msg.context.is_empty() {
        warn!(kind = %msg.kind, "Dropping reply without a context");
        return Vec::new();
    }

    let target = &msg.context;
    match msg.kind {
        MessageType::PRIV_MSG => msg
            .text
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| Line::Message {
                target: target.clone(),
                text: line.to_string(),
            })
            .collect(),
        MessageType::ACTION => msg
            .text
            .lines()
            .next()
            .filter(|line| !line.is_empty())
            .map(|line| Line::Action {
                target: target.clone(),
                text: line.to_string(),
            })
            .into_iter()
            .collect(),
        other => {
            warn!(kind = %other, context = %target, "Dropping reply of unsupported type");
            Vec::new()
        }
    }
}

/// Writes a reply to the wire.
pub async fn deliver(wire: &dyn Wire, msg: &Message) -> Result<(), WireError> {
    for line in render(msg) {
        match &line {
            Line::Message { target, text } => wire.send_message(target, text).await?,
            Line::Action { target, text } => wire.send_action(target, text).await?,
        }
        trace!(?line, "Reply sent");
    }
    Ok(())
}
