//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Config file: an explicit path, or the first `bort.toml` found in the
//!    current directory and then `<config dir>/bort/`
//! 3. Environment variables (`BORT_*`)
//! 4. Programmatic overrides (command line flags)
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `BORT_` prefix with `__` as separator:
//!
//! - `BORT_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `BORT_IRC__NICK=robot` → `irc.nick = "robot"`
//! - `BORT_PLUGINS__FLIP__FLIPPER=x` → `plugins.flip.flipper = "x"`
//!
//! # Example
//!
//! ```rust,ignore
//! use bort_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./bort.toml")
//!     .set("irc.nick", "robot")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Serialized};
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::BortConfig;
use super::validation::validate_config;

/// Base name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "bort.toml";

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Values merged after every other source.
    overrides: Figment,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration file if `path` is `Some`.
    pub fn maybe_file<P: AsRef<Path>>(self, path: Option<P>) -> Self {
        match path {
            Some(path) => self.file(path),
            None => self,
        }
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Overrides a single value by dotted key, e.g. `"irc.nick"`.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Overrides a value when `value` is `Some`.
    pub fn set_opt<T: Serialize>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<BortConfig> {
        let figment = self.build_figment()?;
        let config: BortConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            logging_level = %config.logging.level,
            bridge = %config.bridge.address,
            plugins = config.plugins.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(BortConfig::default()));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment)?;
        }

        if self.load_env {
            trace!("Loading environment variables with BORT_ prefix");
            figment = figment.merge(Env::prefixed("BORT_").split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    /// Merges a single config file into the figment, dispatching on file extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("bort"));
        }
        paths
    }

    /// Merges the first `bort.toml` found on the search paths.
    fn load_config_files(&self, figment: Figment) -> ConfigResult<Figment> {
        for dir in self.resolve_search_paths() {
            let path = dir.join(CONFIG_FILE_NAME);
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                return Self::merge_config_file(figment, &path);
            }
        }

        warn!("No configuration file found, using defaults");
        Ok(figment)
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<BortConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<BortConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================
