//! IRC connection: registration, keep-alive and event translation.
//!
//! Each [`IrcConnector::connect`] opens a fresh TCP connection and spawns
//! two tasks. The writer drains an outbound line queue into the socket; the
//! reader answers `PING`, follows nick changes and forwards events to the
//! supervisor. Dropping the session's event receiver stops the reader, and
//! the writer stops once every [`IrcWire`] handle is gone.

use std::time::Duration;

use async_trait::async_trait;
use bort_runtime::config::IrcConfig;
use bort_runtime::{Wire, WireConnector, WireError, WireEvent, WireSession};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, info, trace, warn};

use crate::line::{Command, Line};

/// Longest accepted inbound line, message tags included.
pub const MAX_LINE_LEN: usize = 8191 + 512;

/// A connection with no traffic for this long is considered dead.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);

const OUTBOUND_QUEUE: usize = 64;
const EVENT_QUEUE: usize = 64;

/// Opens IRC connections to one server under one nick.
#[derive(Debug, Clone)]
pub struct IrcConnector {
    server: String,
    nick: String,
    read_timeout: Duration,
}

impl IrcConnector {
    pub fn new(server: impl Into<String>, nick: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            nick: nick.into(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn from_config(config: &IrcConfig) -> Self {
        Self::new(&config.server, &config.nick)
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }
}

#[async_trait]
impl WireConnector for IrcConnector {
    async fn connect(&self) -> Result<WireSession, WireError> {
        let stream = TcpStream::connect(&self.server)
            .await
            .map_err(|source| WireError::Connect {
                address: self.server.clone(),
                source,
            })?;
        info!(server = %self.server, nick = %self.nick, "Connected to chat server");

        let (read_half, write_half) = stream.into_split();
        let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);

        let mut sink = FramedWrite::new(write_half, LinesCodec::new());
        tokio::spawn(async move {
            while let Some(line) = out_rx.recv().await {
                trace!(line = %line, "Sending");
                // LinesCodec appends the LF.
                if let Err(e) = sink.send(line + "\r").await {
                    debug!(error = %e, "Chat write failed");
                    break;
                }
            }
        });

        let wire = IrcWire { out: out_tx.clone() };
        wire.send(Command::Nick(&self.nick)).await?;
        wire.send(Command::User(&self.nick)).await?;

        let reader = Reader {
            lines: FramedRead::new(
                read_half,
                LinesCodec::new_with_max_length(MAX_LINE_LEN),
            ),
            out: out_tx,
            events: event_tx,
            nick: self.nick.clone(),
            read_timeout: self.read_timeout,
        };
        tokio::spawn(reader.run());

        let wire: Arc<dyn Wire> = Arc::new(wire);
        Ok(WireSession::new(wire, event_rx))
    }
}

/// Send handle of one IRC connection.
#[derive(Debug, Clone)]
pub struct IrcWire {
    out: mpsc::Sender<String>,
}

impl IrcWire {
    async fn send(&self, command: Command<'_>) -> Result<(), WireError> {
        self.out
            .send(command.to_string())
            .await
            .map_err(|_| WireError::Closed)
    }
}

#[async_trait]
impl Wire for IrcWire {
    async fn join(&self, channel: &str) -> Result<(), WireError> {
        self.send(Command::Join(channel)).await
    }

    async fn send_message(&self, target: &str, text: &str) -> Result<(), WireError> {
        self.send(Command::Privmsg(target, text)).await
    }

    async fn send_action(&self, target: &str, text: &str) -> Result<(), WireError> {
        self.send(Command::Action(target, text)).await
    }
}

struct Reader<R> {
    lines: FramedRead<R, LinesCodec>,
    out: mpsc::Sender<String>,
    events: mpsc::Sender<WireEvent>,
    nick: String,
    read_timeout: Duration,
}

impl<R> Reader<R>
where
    R: tokio::io::AsyncRead + Unpin,
{
    async fn run(mut self) {
        let reason = loop {
            let next = match tokio::time::timeout(self.read_timeout, self.lines.next()).await {
                Ok(next) => next,
                Err(_) => break "read timeout".to_string(),
            };
            let text = match next {
                Some(Ok(text)) => text,
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!("Discarding overlong line");
                    continue;
                }
                Some(Err(LinesCodecError::Io(e))) => break e.to_string(),
                None => break "connection closed".to_string(),
            };

            let Some(line) = Line::parse(&text) else {
                continue;
            };
            trace!(line = %line.raw, "Received");

            match self.handle(line).await {
                Ok(None) => {}
                Ok(Some(reason)) => break reason,
                Err(()) => return,
            }
        };

        info!(reason = %reason, "Chat connection ended");
        let _ = self.events.send(WireEvent::Disconnected(reason)).await;
    }

    /// Returns `Ok(Some(reason))` when the server ends the connection and
    /// `Err` when the supervisor stopped listening.
    async fn handle(&mut self, line: Line) -> Result<Option<String>, ()> {
        match line.command.as_str() {
            "PING" => {
                let _ = self.out.send(Command::Pong(line.trailing()).to_string()).await;
            }
            "001" => {
                if let Some(nick) = line.param(0) {
                    self.nick = nick.to_string();
                }
                self.emit(WireEvent::Welcome).await?;
            }
            "433" => {
                self.nick.push('_');
                warn!(nick = %self.nick, "Nick in use, retrying");
                let _ = self.out.send(Command::Nick(&self.nick).to_string()).await;
            }
            "NICK" if line.nick() == self.nick => {
                self.nick = line.trailing().to_string();
                info!(nick = %self.nick, "Nick changed");
            }
            "ERROR" => return Ok(Some(line.trailing().to_string())),
            "JOIN" => {
                if line.nick().eq_ignore_ascii_case(&self.nick) {
                    let channel = line.param(0).unwrap_or_default().to_string();
                    self.emit(WireEvent::Joined {
                        nick: self.nick.clone(),
                        channel,
                    })
                    .await?;
                }
                self.emit(WireEvent::Message(line.to_raw_event())).await?;
            }
            "PRIVMSG" | "PART" => {
                self.emit(WireEvent::Message(line.to_raw_event())).await?;
            }
            _ => {}
        }
        Ok(None)
    }

    async fn emit(&self, event: WireEvent) -> Result<(), ()> {
        self.events.send(event).await.map_err(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    async fn server() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    #[tokio::test]
    async fn test_session() {
        let (listener, addr) = server().await;
        let connector = IrcConnector::new(&addr, "bort");

        let (session, accepted) = tokio::join!(connector.connect(), listener.accept());
        let WireSession { wire, mut events } = session.unwrap();
        let (stream, _) = accepted.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        assert_eq!(lines.next_line().await.unwrap().unwrap(), "NICK bort");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "USER bort 0 * :bort");

        write_half.write_all(b"PING :srv\r\n").await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "PONG :srv");

        write_half.write_all(b":srv 433 * bort :in use\r\n").await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "NICK bort_");

        write_half.write_all(b":srv 001 bort_ :Welcome\r\n").await.unwrap();
        assert_eq!(events.recv().await.unwrap(), WireEvent::Welcome);

        wire.join("#bort").await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "JOIN #bort");

        write_half
            .write_all(b":bort_!b@h JOIN #bort\r\n:alice!a@h PRIVMSG #bort :bort: flip\r\n")
            .await
            .unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            WireEvent::Joined {
                nick: "bort_".into(),
                channel: "#bort".into()
            }
        );
        assert!(matches!(events.recv().await.unwrap(), WireEvent::Message(e) if e.verb == "JOIN"));
        match events.recv().await.unwrap() {
            WireEvent::Message(e) => {
                assert_eq!(e.nick, "alice");
                assert_eq!(e.text, "bort: flip");
            }
            other => panic!("unexpected event {other:?}"),
        }

        wire.send_message("#bort", "hi").await.unwrap();
        wire.send_action("alice", "waves").await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "PRIVMSG #bort :hi");
        assert_eq!(
            lines.next_line().await.unwrap().unwrap(),
            "PRIVMSG alice :\x01ACTION waves\x01"
        );

        write_half.write_all(b"ERROR :Closing link\r\n").await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            WireEvent::Disconnected("Closing link".into())
        );
    }

    #[tokio::test]
    async fn test_eof_disconnects() {
        let (listener, addr) = server().await;
        let connector = IrcConnector::new(&addr, "bort");

        let (session, accepted) = tokio::join!(connector.connect(), listener.accept());
        let mut session = session.unwrap();
        drop(accepted.unwrap());

        assert!(matches!(
            session.events.recv().await.unwrap(),
            WireEvent::Disconnected(_)
        ));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let (listener, addr) = server().await;
        drop(listener);

        let err = IrcConnector::new(&addr, "bort").connect().await.unwrap_err();
        assert!(matches!(err, WireError::Connect { .. }));
    }
}
