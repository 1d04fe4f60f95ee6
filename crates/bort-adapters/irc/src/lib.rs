//! IRC adapter for bort.
//!
//! A small line-based IRC client that implements the runtime's chat wire:
//!
//! ```rust,ignore
//! use bort_adapter_irc::IrcConnector;
//! use bort_runtime::Supervisor;
//!
//! let connector = IrcConnector::from_config(&config.irc);
//! Supervisor::from_config(connector, &config).run_until(shutdown_signal()).await;
//! ```
//!
//! Only what the bot needs is handled: registration, `PING`, nick
//! collisions, and `PRIVMSG`/`JOIN`/`PART` events. Actions are sent as CTCP
//! `ACTION` messages.

pub mod connection;
pub mod line;

pub use connection::{DEFAULT_READ_TIMEOUT, IrcConnector, IrcWire, MAX_LINE_LEN};
pub use line::{Command, Line, Prefix};
