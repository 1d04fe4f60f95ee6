//! IRC line parsing.
//!
//! A line is `[@tags] [:prefix] COMMAND [params...] [:trailing]` without the
//! CRLF terminator. Tags are accepted and discarded.

use std::fmt;

use bort_core::RawEvent;

/// Message source, `nick!user@host` or a server name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefix {
    pub nick: String,
    pub user: String,
    pub host: String,
}

impl Prefix {
    pub fn parse(s: &str) -> Self {
        let (nick, rest) = match s.split_once('!') {
            Some((nick, rest)) => (nick, Some(rest)),
            None => (s, None),
        };
        let (nick, user, host) = match rest {
            Some(rest) => match rest.split_once('@') {
                Some((user, host)) => (nick, user, host),
                None => (nick, rest, ""),
            },
            None => match nick.split_once('@') {
                Some((nick, host)) => (nick, "", host),
                None => (nick, "", ""),
            },
        };
        Self {
            nick: nick.to_string(),
            user: user.to_string(),
            host: host.to_string(),
        }
    }
}

/// One parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub prefix: Option<Prefix>,
    /// Upper-cased command or numeric.
    pub command: String,
    pub params: Vec<String>,
    /// The line as received.
    pub raw: String,
}

impl Line {
    /// Parses a line. Returns `None` for an empty line or one without a
    /// command.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut rest = raw.trim_end_matches(['\r', '\n']);

        if let Some(tagged) = rest.strip_prefix('@') {
            rest = tagged.split_once(' ').map_or("", |(_, r)| r);
        }
        rest = rest.trim_start_matches(' ');

        let prefix = match rest.strip_prefix(':') {
            Some(prefixed) => {
                let (prefix, r) = prefixed.split_once(' ').unwrap_or((prefixed, ""));
                rest = r.trim_start_matches(' ');
                Some(Prefix::parse(prefix))
            }
            None => None,
        };

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (param, r) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_string());
            rest = r;
        }

        Some(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
            raw: raw.trim_end_matches(['\r', '\n']).to_string(),
        })
    }

    pub fn nick(&self) -> &str {
        self.prefix.as_ref().map_or("", |p| p.nick.as_str())
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The last parameter, which carries the text of a PRIVMSG.
    pub fn trailing(&self) -> &str {
        self.params.last().map_or("", String::as_str)
    }

    /// Converts the line into the event the classifier consumes.
    pub fn to_raw_event(&self) -> RawEvent {
        let prefix = self.prefix.clone().unwrap_or_default();
        let text = if self.params.len() > 1 {
            self.trailing().to_string()
        } else {
            String::new()
        };
        RawEvent {
            verb: self.command.clone(),
            nick: prefix.nick,
            user: prefix.user,
            host: prefix.host,
            target: self.param(0).unwrap_or_default().to_string(),
            text,
            params: self.params.clone(),
            raw: self.raw.clone(),
        }
    }
}

/// An outgoing command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Nick(&'a str),
    User(&'a str),
    Pong(&'a str),
    Join(&'a str),
    Privmsg(&'a str, &'a str),
    Action(&'a str, &'a str),
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Nick(nick) => write!(f, "NICK {nick}"),
            Self::User(name) => write!(f, "USER {name} 0 * :{name}"),
            Self::Pong(token) => write!(f, "PONG :{token}"),
            Self::Join(channel) => write!(f, "JOIN {channel}"),
            Self::Privmsg(target, text) => write!(f, "PRIVMSG {target} :{}", sanitize(text)),
            Self::Action(target, text) => {
                write!(f, "PRIVMSG {target} :\x01ACTION {}\x01", sanitize(text))
            }
        }
    }
}

/// Text cannot carry line breaks; anything after one would be read as a
/// separate command.
fn sanitize(text: &str) -> &str {
    text.split(['\r', '\n']).next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privmsg() {
        let line = Line::parse(":alice!al@example.org PRIVMSG #bort :bort: flip hi there\r\n").unwrap();
        assert_eq!(line.command, "PRIVMSG");
        assert_eq!(line.nick(), "alice");
        assert_eq!(line.params, vec!["#bort", "bort: flip hi there"]);

        let event = line.to_raw_event();
        assert_eq!(event.verb, "PRIVMSG");
        assert_eq!(event.user, "al");
        assert_eq!(event.host, "example.org");
        assert_eq!(event.target, "#bort");
        assert_eq!(event.text, "bort: flip hi there");
        assert_eq!(event.raw, ":alice!al@example.org PRIVMSG #bort :bort: flip hi there");
    }

    #[test]
    fn test_parse_without_prefix_and_tags() {
        let line = Line::parse("PING :irc.example.org").unwrap();
        assert_eq!(line.prefix, None);
        assert_eq!(line.command, "PING");
        assert_eq!(line.trailing(), "irc.example.org");

        let tagged = Line::parse("@time=2024-01-01T00:00:00Z :srv 001 bort :Welcome").unwrap();
        assert_eq!(tagged.command, "001");
        assert_eq!(tagged.nick(), "srv");
        assert_eq!(tagged.params, vec!["bort", "Welcome"]);
    }

    #[test]
    fn test_parse_join_without_trailing() {
        let line = Line::parse(":bort!~b@host join #Bort").unwrap();
        assert_eq!(line.command, "JOIN");
        let event = line.to_raw_event();
        assert_eq!(event.target, "#Bort");
        assert_eq!(event.text, "");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(Line::parse(""), None);
        assert_eq!(Line::parse(":prefix.only"), None);
    }

    #[test]
    fn test_prefix_forms() {
        assert_eq!(
            Prefix::parse("irc.example.org"),
            Prefix {
                nick: "irc.example.org".into(),
                ..Default::default()
            }
        );
        assert_eq!(
            Prefix::parse("nick@host"),
            Prefix {
                nick: "nick".into(),
                user: "".into(),
                host: "host".into()
            }
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(Command::User("bort").to_string(), "USER bort 0 * :bort");
        assert_eq!(
            Command::Privmsg("#bort", "one\r\nQUIT").to_string(),
            "PRIVMSG #bort :one"
        );
        assert_eq!(
            Command::Action("#bort", "waves").to_string(),
            "PRIVMSG #bort :\x01ACTION waves\x01"
        );
    }
}
