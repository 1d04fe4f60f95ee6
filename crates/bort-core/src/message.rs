//! Message model shared by both sides of the bridge.
//!
//! A [`Message`] describes an inbound chat event as well as an outbound reply.
//! Its [`MessageType`] is a bitmask so that matchers can subscribe to several
//! kinds of events at once.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

// ============================================================================
// MessageType
// ============================================================================

/// Bitmapped chat message type.
///
/// A single message carries exactly one bit (or none); matcher filters may
/// combine several with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageType(u8);

impl MessageType {
    /// No type. Outputs of this type are never delivered.
    pub const NONE: Self = Self(0);
    /// A regular channel or private message.
    pub const PRIV_MSG: Self = Self(1);
    /// A CTCP action (`/me`).
    pub const ACTION: Self = Self(1 << 1);
    /// A user joined a channel.
    pub const JOIN: Self = Self(1 << 2);
    /// A user left a channel.
    pub const PART: Self = Self(1 << 3);
    /// Every non-`NONE` type.
    pub const ALL: Self = Self(Self::PRIV_MSG.0 | Self::ACTION.0 | Self::JOIN.0 | Self::PART.0);

    /// Returns the raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Builds a type from raw bits, dropping unknown bits.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Returns `true` if no bit is set.
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the two masks share at least one bit.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if every bit of `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MessageType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MessageType {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        let names = [
            (Self::PRIV_MSG, "privmsg"),
            (Self::ACTION, "action"),
            (Self::JOIN, "join"),
            (Self::PART, "part"),
        ];
        let mut first = true;
        for (bit, name) in names {
            if self.contains(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Message
// ============================================================================

/// An incoming or outgoing chat message.
///
/// `kind`, `context` and `text` are meaningful in both directions. Everything
/// else is provenance or parse state filled in on ingress and ignored when a
/// message is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Reply target: a channel, or the sender's nick for private messages.
    pub context: String,
    /// Free-form content.
    pub text: String,

    /// Parsed command name, if the message was addressed to the bot.
    pub command: Option<String>,
    /// Command arguments (trimmed, possibly empty).
    pub args: String,
    /// Text captured by the matcher currently handling the message.
    pub matched: String,

    /// Sender nick.
    pub nick: String,
    /// Sender user name.
    pub user: String,
    /// Sender host.
    pub host: String,
    /// Protocol verb the message was classified from (e.g. `PRIVMSG`).
    pub irc_command: String,
    /// Raw protocol parameters.
    pub params: Vec<String>,
    /// Raw protocol line.
    pub raw: String,
}

impl Message {
    /// Creates a message of the given type for a context.
    pub fn new(kind: MessageType, context: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// An output that produces nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// A `PRIV_MSG` reply to the same context as `self`.
    pub fn reply(&self, text: impl Into<String>) -> Self {
        Self::new(MessageType::PRIV_MSG, self.context.clone(), text)
    }

    /// An `ACTION` reply to the same context as `self`.
    pub fn action(&self, text: impl Into<String>) -> Self {
        Self::new(MessageType::ACTION, self.context.clone(), text)
    }

    /// A `PRIV_MSG` reply sent privately to the sender.
    pub fn reply_private(&self, text: impl Into<String>) -> Self {
        Self::new(MessageType::PRIV_MSG, self.sender(), text)
    }

    /// Redirects this message to another context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Returns the sender identity, falling back to the context when the
    /// message carries no nick.
    pub fn sender(&self) -> &str {
        if self.nick.is_empty() {
            &self.context
        } else {
            &self.nick
        }
    }

    /// Returns `true` if the message was sent directly to the bot rather than
    /// to a channel.
    pub fn is_private(&self) -> bool {
        !self.nick.is_empty() && self.context == self.nick
    }

    /// Returns the parsed command, if any.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_every_type() {
        for kind in [
            MessageType::PRIV_MSG,
            MessageType::ACTION,
            MessageType::JOIN,
            MessageType::PART,
        ] {
            assert!(MessageType::ALL.intersects(kind));
        }
        assert!(!MessageType::ALL.intersects(MessageType::NONE));
        assert_eq!(MessageType::ALL.bits(), 0b1111);
    }

    #[test]
    fn test_mask_combination() {
        let mask = MessageType::PRIV_MSG | MessageType::ACTION;
        assert!(mask.intersects(MessageType::ACTION));
        assert!(!mask.intersects(MessageType::JOIN));
        assert_eq!(mask.to_string(), "privmsg|action");
        assert_eq!(MessageType::from_bits_truncate(0xff), MessageType::ALL);
    }

    #[test]
    fn test_reply_keeps_context() {
        let mut msg = Message::new(MessageType::PRIV_MSG, "#room", "hi");
        msg.nick = "alice".into();

        let reply = msg.reply("hello");
        assert_eq!(reply.kind, MessageType::PRIV_MSG);
        assert_eq!(reply.context, "#room");

        let private = msg.reply_private("psst");
        assert_eq!(private.context, "alice");
        assert!(!msg.is_private());
    }

    #[test]
    fn test_serde_uses_type_key() {
        let msg = Message::new(MessageType::JOIN, "#room", "");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], 4);

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
