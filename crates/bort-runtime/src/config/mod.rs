//! Configuration module for the bort runtime.
//!
//! One TOML file (`bort.toml`) configures both processes: the front-end reads
//! `[irc]`, `[bridge]` and `[supervisor]`, the plugin host reads `[bridge]`,
//! `[host]` and `[plugins.*]`.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_FILE_NAME, ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    BortConfig, BridgeConfig, HostConfig, IrcConfig, LogFormat, LogLevel, LogOutput,
    LoggingConfig, SpanEventConfig, SupervisorConfig,
};
pub use validation::{validate_channel, validate_config, validate_frontend};
