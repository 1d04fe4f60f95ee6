//! Inbound event classification.
//!
//! Turns a protocol-level [`RawEvent`] into a typed [`Message`]: picks the
//! message type, computes the reply context, and parses commands out of
//! private messages.

use serde::{Deserialize, Serialize};

use crate::message::{Message, MessageType};

/// Characters that open a channel name.
pub const CHANNEL_PREFIXES: &[char] = &['#', '&', '+', '!'];

const CTCP_ACTION_OPEN: &str = "\x01ACTION ";
const CTCP_DELIM: char = '\x01';

/// Returns `true` if `target` names a channel.
pub fn is_channel(target: &str) -> bool {
    target.starts_with(CHANNEL_PREFIXES)
}

/// An event as delivered by the chat wire, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEvent {
    /// Protocol verb, e.g. `PRIVMSG` or `JOIN`.
    pub verb: String,
    pub nick: String,
    pub user: String,
    pub host: String,
    /// First parameter: a channel or the bot's own nick.
    pub target: String,
    /// Trailing text.
    pub text: String,
    /// All parameters, including `target` and `text`.
    pub params: Vec<String>,
    /// The unparsed line.
    pub raw: String,
}

/// Classifies raw events for a bot using a given command prefix.
#[derive(Debug, Clone)]
pub struct Classifier {
    prefix: String,
}

impl Classifier {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Classifies `event`.
    ///
    /// Returns `None` for verbs the bot does not route, and for events whose
    /// reply context would be empty.
    pub fn classify(&self, event: &RawEvent) -> Option<Message> {
        let mut msg = match event.verb.to_ascii_uppercase().as_str() {
            "PRIVMSG" => self.classify_privmsg(event),
            "JOIN" => classify_membership(MessageType::JOIN, event),
            "PART" => classify_membership(MessageType::PART, event),
            _ => None,
        }?;

        if msg.context.is_empty() {
            return None;
        }
        msg.nick = event.nick.clone();
        msg.user = event.user.clone();
        msg.host = event.host.clone();
        msg.irc_command = event.verb.clone();
        msg.params = event.params.clone();
        msg.raw = event.raw.clone();
        Some(msg)
    }

    fn classify_privmsg(&self, event: &RawEvent) -> Option<Message> {
        let private = !is_channel(&event.target);
        let context = if private {
            event.nick.clone()
        } else {
            event.target.clone()
        };

        if let Some(body) = strip_action(&event.text) {
            return Some(Message::new(MessageType::ACTION, context, body));
        }

        let mut msg = Message::new(MessageType::PRIV_MSG, context, event.text.clone());
        if let Some((command, args)) = self.parse_command(&event.text, private) {
            msg.command = Some(command);
            msg.args = args;
        }
        Some(msg)
    }

    /// Splits a command line into `(command, args)`.
    fn parse_command(&self, text: &str, private: bool) -> Option<(String, String)> {
        let text = text.trim();
        let line = if private {
            text
        } else if self.prefix.is_empty() {
            return None;
        } else {
            text.strip_prefix(self.prefix.as_str())?
        };

        let line = line.trim_start();
        let (command, args) = match line.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (line, ""),
        };
        Some((command.to_owned(), args.to_owned()))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new("bort:")
    }
}

fn classify_membership(kind: MessageType, event: &RawEvent) -> Option<Message> {
    let channel = if event.target.is_empty() {
        event.params.first()?.clone()
    } else {
        event.target.clone()
    };
    Some(Message::new(kind, channel, event.text.clone()))
}

fn strip_action(text: &str) -> Option<String> {
    let body = text.strip_prefix(CTCP_ACTION_OPEN)?;
    let body = body.strip_suffix(CTCP_DELIM).unwrap_or(body);
    Some(body.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn privmsg(target: &str, text: &str) -> RawEvent {
        RawEvent {
            verb: "PRIVMSG".into(),
            nick: "alice".into(),
            user: "~alice".into(),
            host: "example.org".into(),
            target: target.into(),
            text: text.into(),
            params: vec![target.into(), text.into()],
            raw: format!(":alice!~alice@example.org PRIVMSG {target} :{text}"),
        }
    }

    #[test]
    fn test_channel_command() {
        let msg = Classifier::default()
            .classify(&privmsg("#room", "  bort: flip   hello  world "))
            .unwrap();
        assert_eq!(msg.kind, MessageType::PRIV_MSG);
        assert_eq!(msg.context, "#room");
        assert_eq!(msg.command.as_deref(), Some("flip"));
        assert_eq!(msg.args, "hello  world");
        assert_eq!(msg.text, "  bort: flip   hello  world ");
        assert_eq!(msg.nick, "alice");
        assert_eq!(msg.host, "example.org");
        assert_eq!(msg.irc_command, "PRIVMSG");
        assert!(!msg.is_private());
    }

    #[test]
    fn test_channel_chatter_has_no_command() {
        let msg = Classifier::default()
            .classify(&privmsg("#room", "nice table flip"))
            .unwrap();
        assert_eq!(msg.command, None);
        assert_eq!(msg.args, "");
    }

    #[test]
    fn test_bare_prefix_is_empty_command() {
        let msg = Classifier::default().classify(&privmsg("#room", "bort:")).unwrap();
        assert_eq!(msg.command.as_deref(), Some(""));
        assert_eq!(msg.args, "");
    }

    #[test]
    fn test_private_message_is_command_input() {
        let classifier = Classifier::default();

        let msg = classifier.classify(&privmsg("bort", "calc 1 2 +")).unwrap();
        assert_eq!(msg.context, "alice");
        assert!(msg.is_private());
        assert_eq!(msg.command.as_deref(), Some("calc"));
        assert_eq!(msg.args, "1 2 +");

        // The prefix is not stripped in private.
        let msg = classifier.classify(&privmsg("bort", "bort: calc 1")).unwrap();
        assert_eq!(msg.command.as_deref(), Some("bort:"));
        assert_eq!(msg.args, "calc 1");
    }

    #[test]
    fn test_ctcp_action() {
        let msg = Classifier::default()
            .classify(&privmsg("#room", "\x01ACTION waves at bort\x01"))
            .unwrap();
        assert_eq!(msg.kind, MessageType::ACTION);
        assert_eq!(msg.text, "waves at bort");
        assert_eq!(msg.command, None);
    }

    #[test]
    fn test_join_and_part() {
        let classifier = Classifier::default();
        let join = RawEvent {
            verb: "JOIN".into(),
            nick: "bob".into(),
            params: vec!["#room".into()],
            ..Default::default()
        };
        let msg = classifier.classify(&join).unwrap();
        assert_eq!(msg.kind, MessageType::JOIN);
        assert_eq!(msg.context, "#room");
        assert_eq!(msg.nick, "bob");

        let part = RawEvent {
            verb: "part".into(),
            nick: "bob".into(),
            target: "&local".into(),
            text: "bye".into(),
            ..Default::default()
        };
        let msg = classifier.classify(&part).unwrap();
        assert_eq!(msg.kind, MessageType::PART);
        assert_eq!(msg.context, "&local");
        assert_eq!(msg.text, "bye");
    }

    #[test]
    fn test_unrouted_events_are_dropped() {
        let classifier = Classifier::default();
        let notice = RawEvent {
            verb: "NOTICE".into(),
            target: "#room".into(),
            ..Default::default()
        };
        assert!(classifier.classify(&notice).is_none());

        let join = RawEvent {
            verb: "JOIN".into(),
            ..Default::default()
        };
        assert!(classifier.classify(&join).is_none());

        let mut anonymous = privmsg("bort", "hi");
        anonymous.nick.clear();
        assert!(classifier.classify(&anonymous).is_none());
    }

    #[test]
    fn test_channel_prefixes() {
        for target in ["#a", "&a", "+a", "!a"] {
            assert!(is_channel(target), "{target}");
        }
        assert!(!is_channel("alice"));
        assert!(!is_channel(""));
    }
}
