//! Configuration validation utilities.

use bort_core::is_channel;

use super::error::{ConfigError, ConfigResult};
use super::schema::{BortConfig, BridgeConfig, HostConfig, LogOutput, LoggingConfig};

/// Validates the settings both processes use.
pub fn validate_config(config: &BortConfig) -> ConfigResult<()> {
    validate_logging(&config.logging)?;
    validate_bridge(&config.bridge)?;
    validate_host(&config.host)?;

    if config.supervisor.reconnect_delay_ms == 0 {
        return Err(ConfigError::validation(
            "Reconnect delay must be greater than 0",
        ));
    }
    if config.supervisor.max_reconnect_delay_ms < config.supervisor.reconnect_delay_ms {
        return Err(ConfigError::validation(
            "Max reconnect delay must be greater than or equal to reconnect delay",
        ));
    }

    if !config.irc.channel.is_empty() {
        validate_channel(&config.irc.channel)?;
    }

    Ok(())
}

/// Validates the settings only the front-end needs.
pub fn validate_frontend(config: &BortConfig) -> ConfigResult<()> {
    validate_config(config)?;

    if config.irc.nick.is_empty() {
        return Err(ConfigError::missing_field("irc.nick"));
    }
    if config.irc.server.is_empty() {
        return Err(ConfigError::missing_field("irc.server"));
    }
    if config.irc.channel.is_empty() {
        return Err(ConfigError::missing_field("irc.channel"));
    }

    Ok(())
}

/// Checks that `channel` is a channel name.
pub fn validate_channel(channel: &str) -> ConfigResult<()> {
    if !is_channel(channel) || channel.contains([' ', ',']) {
        return Err(ConfigError::validation(format!(
            "{channel} is not a valid channel"
        )));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

fn validate_bridge(bridge: &BridgeConfig) -> ConfigResult<()> {
    if bridge.address.is_empty() {
        return Err(ConfigError::missing_field("bridge.address"));
    }
    if bridge.timeout_ms == 0 {
        return Err(ConfigError::validation("Bridge timeout must be greater than 0"));
    }
    if bridge.poll_interval_ms == 0 {
        return Err(ConfigError::validation(
            "Poll interval must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_host(host: &HostConfig) -> ConfigResult<()> {
    if host.outbox_capacity == 0 {
        return Err(ConfigError::validation(
            "Outbox capacity must be greater than 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&BortConfig::default()).is_ok());
    }

    #[test]
    fn test_frontend_needs_channel() {
        let mut config = BortConfig::default();
        assert!(matches!(
            validate_frontend(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.irc.channel = "#bort".into();
        assert!(validate_frontend(&config).is_ok());
    }

    #[test]
    fn test_channel_names() {
        assert!(validate_channel("#bort").is_ok());
        assert!(validate_channel("&local").is_ok());
        assert!(validate_channel("bort").is_err());
        assert!(validate_channel("#a b").is_err());
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = BortConfig::default();
        config.host.outbox_capacity = 0;
        assert!(validate_config(&config).is_err());

        let mut config = BortConfig::default();
        config.bridge.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = BortConfig::default();
        config.bridge.timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = BortConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("bort.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
