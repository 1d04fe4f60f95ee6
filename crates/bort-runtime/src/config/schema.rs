//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration, shared by `bort` and `bortplug`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BortConfig {
    /// Logging settings.
    pub logging: LoggingConfig,

    /// Chat connection settings (front-end).
    pub irc: IrcConfig,

    /// Bridge address and timing.
    pub bridge: BridgeConfig,

    /// Reconnect behaviour of the front-end.
    pub supervisor: SupervisorConfig,

    /// Plugin host settings.
    pub host: HostConfig,

    /// Per-plugin sections, keyed by plugin name.
    pub plugins: Map<String, Value>,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level. `RUST_LOG` takes precedence when set.
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Required when `output = "file"`.
    pub file_path: Option<PathBuf>,
    /// Per-target levels, e.g. `bort_transport = "debug"`.
    pub filters: BTreeMap<String, LogLevel>,
    pub span_events: SpanEventConfig,
    pub thread_ids: bool,
    /// Include file and line of the call site.
    pub file_location: bool,
}

// =============================================================================
// Front-end
// =============================================================================

/// `[irc]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrcConfig {
    /// Nick, also used as user name.
    pub nick: String,
    /// `host:port` of the IRC server.
    pub server: String,
    /// Channel to join. Usually given on the command line.
    pub channel: String,
    /// Prefix that marks channel messages as commands.
    pub prefix: String,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            nick: "bort".to_string(),
            server: "irc.libera.chat:6667".to_string(),
            channel: String::new(),
            prefix: "bort:".to_string(),
        }
    }
}

/// `[bridge]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Address the plugin host listens on and the front-end dials.
    pub address: String,
    /// Bound on a single bridge call.
    pub timeout_ms: u64,
    /// How often the front-end pulls pushed messages.
    pub poll_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:1234".to_string(),
            timeout_ms: 10_000,
            poll_interval_ms: 1_000,
        }
    }
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `[supervisor]` section.
///
/// With the default `max_reconnect_delay_ms` equal to `reconnect_delay_ms`
/// the delay between attempts is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 5_000,
            max_reconnect_delay_ms: 5_000,
        }
    }
}

impl SupervisorConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }
}

// =============================================================================
// Plugin host
// =============================================================================

/// `[host]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Maximum number of queued push messages.
    pub outbox_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BortConfig::default();
        assert_eq!(config.irc.nick, "bort");
        assert_eq!(config.irc.prefix, "bort:");
        assert_eq!(config.bridge.address, "127.0.0.1:1234");
        assert_eq!(config.bridge.timeout(), Duration::from_secs(10));
        assert_eq!(config.supervisor.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.host.outbox_capacity, 64);
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_level_names() {
        let level: LogLevel = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(level, LogLevel::Debug);
        assert_eq!(level.to_tracing_level(), tracing::Level::DEBUG);
        assert!(serde_json::from_str::<LogLevel>("\"loud\"").is_err());
    }
}
