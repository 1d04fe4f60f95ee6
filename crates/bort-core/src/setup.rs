//! Plugin setup support.
//!
//! Setup functions run once, in registration order, before the engine starts
//! serving. They typically read the plugin's slice of the configuration and
//! register matchers or commands that depend on it.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::registry::Registry;

/// A one-shot plugin initializer.
pub type SetupFn = Box<dyn FnOnce(&Registry, &PluginConfig) -> anyhow::Result<()> + Send>;

/// The `plugins` table of the configuration, handed to every setup function.
#[derive(Debug, Clone, Default)]
pub struct PluginConfig {
    raw: Value,
}

impl PluginConfig {
    /// Wraps a raw configuration value.
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// Returns the raw value.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Deserializes the section named `name`.
    ///
    /// Returns `Ok(None)` when the section is absent.
    pub fn section<T>(&self, name: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.raw.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(T::deserialize(value)?)),
        }
    }
}

impl From<Value> for PluginConfig {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct FlipSection {
        flipper: String,
    }

    #[test]
    fn test_section_present() {
        let config = PluginConfig::new(json!({ "flip": { "flipper": "x " } }));
        let section: Option<FlipSection> = config.section("flip").unwrap();
        assert_eq!(
            section,
            Some(FlipSection {
                flipper: "x ".into()
            })
        );
    }

    #[test]
    fn test_section_absent_or_invalid() {
        let config = PluginConfig::new(json!({ "flip": 3 }));
        assert!(config.section::<FlipSection>("heckle").unwrap().is_none());
        assert!(config.section::<FlipSection>("flip").is_err());
    }
}
