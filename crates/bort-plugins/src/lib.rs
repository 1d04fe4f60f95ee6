//! Built-in plugins for bort.
//!
//! Plugins are composed statically: each exposes a `register` function that
//! adds its commands, matchers and setup functions to a [`Registry`], and
//! [`all`] lists them. Rebuilding `bortplug` with a different list changes
//! the plugin set.
//!
//! ```rust,ignore
//! let host = PluginHost::from_config(&config);
//! let failures = bort_plugins::register_all(host.registry(), host.outbox_sender());
//! ```

use bort_core::{OutboxSender, Registry, RegistryError, RegistryResult};
use thiserror::Error;
use tracing::{debug, error, info};

pub mod calc;
pub mod flip;
pub mod heckle;

/// A static handle to one plugin.
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    /// Name used in logs and as the config section key.
    pub name: &'static str,
    /// Adds the plugin's handlers to a registry.
    pub register: fn(&Registry, OutboxSender) -> RegistryResult<()>,
}

/// A plugin whose registration failed. Only that plugin is affected.
#[derive(Debug, Error)]
#[error("plugin '{plugin}' failed to register: {source}")]
pub struct RegisterError {
    pub plugin: &'static str,
    #[source]
    pub source: RegistryError,
}

/// Every built-in plugin, in registration order.
pub fn all() -> Vec<PluginDescriptor> {
    vec![
        PluginDescriptor {
            name: "calc",
            register: calc::register,
        },
        PluginDescriptor {
            name: "flip",
            register: flip::register,
        },
        PluginDescriptor {
            name: "heckle",
            register: heckle::register,
        },
    ]
}

/// Registers `plugins` on `registry`.
///
/// A failing plugin is logged and skipped; the remaining plugins are still
/// registered. Handlers a failing plugin added before its error stay in place.
pub fn register(
    registry: &Registry,
    outbox: &OutboxSender,
    plugins: &[PluginDescriptor],
) -> Vec<RegisterError> {
    let mut failures = Vec::new();
    for plugin in plugins {
        match (plugin.register)(registry, outbox.clone()) {
            Ok(()) => debug!(plugin = plugin.name, "Plugin registered"),
            Err(source) => {
                error!(plugin = plugin.name, error = %source, "Plugin registration failed");
                failures.push(RegisterError {
                    plugin: plugin.name,
                    source,
                });
            }
        }
    }
    info!(
        registered = plugins.len() - failures.len(),
        failed = failures.len(),
        "Plugins registered"
    );
    failures
}

/// Registers every built-in plugin.
pub fn register_all(registry: &Registry, outbox: OutboxSender) -> Vec<RegisterError> {
    register(registry, &outbox, &all())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bort_core::Outbox;

    #[test]
    fn test_register_all() {
        let registry = Registry::new();
        assert!(register_all(&registry, Outbox::new(4).sender()).is_empty());
        assert_eq!(registry.command_names(), vec!["calc", "flip"]);
        assert!(registry.help_text().contains("flip text (or tables by default)"));

        // A second registration collides on command names for both commands.
        let failures = register_all(&registry, Outbox::new(4).sender());
        let names: Vec<_> = failures.iter().map(|f| f.plugin).collect();
        assert_eq!(names, vec!["calc", "flip"]);
    }

    fn broken(registry: &Registry, _outbox: OutboxSender) -> RegistryResult<()> {
        registry.register_command("", "no name", |msg: bort_core::Message| async move {
            Ok::<_, anyhow::Error>(msg.reply("unreachable"))
        })
    }

    #[test]
    fn test_failing_plugin_does_not_stop_siblings() {
        let registry = Registry::new();
        let plugins = [
            PluginDescriptor {
                name: "broken",
                register: broken,
            },
            PluginDescriptor {
                name: "flip",
                register: flip::register,
            },
        ];

        let failures = register(&registry, &Outbox::new(4).sender(), &plugins);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].plugin, "broken");
        assert!(matches!(failures[0].source, RegistryError::EmptyCommandName));
        assert_eq!(registry.command_names(), vec!["flip"]);
    }
}
