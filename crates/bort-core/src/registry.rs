//! Command and matcher registries.
//!
//! The [`Registry`] maps messages to handlers two ways:
//!
//! - **Commands**: exact-name lookup, one handler per name.
//! - **Matchers**: an ordered list of `(type mask, regex, handler)` entries,
//!   evaluated in registration order.
//!
//! # Concurrency
//!
//! Both tables live behind a single reader-writer lock. Dispatch takes cheap
//! `Arc` snapshots under the read lock and releases it before any handler
//! runs, so registering or unregistering while a dispatch is in flight is
//! safe; the in-flight dispatch keeps seeing the snapshot it started with.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use regex::Regex;
use tracing::{debug, error, info};

use crate::error::{RegistryError, RegistryResult, SetupError};
use crate::handler::{BoxedHandler, Handler, into_handler};
use crate::message::MessageType;
use crate::setup::{PluginConfig, SetupFn};

// ============================================================================
// Entries
// ============================================================================

/// Identifier assigned to a matcher at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatcherId(u64);

impl MatcherId {
    /// Returns the numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered command.
pub struct CommandEntry {
    name: String,
    help: String,
    handler: BoxedHandler,
}

impl CommandEntry {
    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line help text.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// The command handler.
    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

/// A registered matcher.
pub struct Matcher {
    id: MatcherId,
    types: MessageType,
    pattern: Regex,
    handler: BoxedHandler,
}

impl Matcher {
    /// Matcher identifier.
    pub fn id(&self) -> MatcherId {
        self.id
    }

    /// Message types this matcher is eligible for.
    pub fn types(&self) -> MessageType {
        self.types
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// The matcher handler.
    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    /// Returns whether this matcher should see messages of type `kind`.
    pub fn accepts(&self, kind: MessageType) -> bool {
        self.types.intersects(kind)
    }

    /// Applies the pattern to `text`.
    ///
    /// On a match, returns the text of the first capturing group if the
    /// pattern has one (empty when that group did not participate), otherwise
    /// the whole match.
    pub fn capture(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let group = if self.pattern.captures_len() > 1 {
            caps.get(1)
        } else {
            caps.get(0)
        };
        Some(group.map(|m| m.as_str().to_owned()).unwrap_or_default())
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("id", &self.id)
            .field("types", &self.types)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Default)]
struct Tables {
    commands: BTreeMap<String, Arc<CommandEntry>>,
    matchers: Vec<Arc<Matcher>>,
}

/// Holds every command, matcher and pending setup function of one engine.
///
/// Plugins register against a shared `Arc<Registry>` built at process start;
/// independent registries can coexist (e.g. one per test).
#[derive(Default)]
pub struct Registry {
    tables: RwLock<Tables>,
    setups: Mutex<Vec<(String, SetupFn)>>,
    last_matcher_id: AtomicU64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command handler under `name`.
    ///
    /// `help` is a one-line description shown by the built-in `help` command.
    /// Fails if the name is empty or already taken; an existing command is
    /// never overwritten.
    pub fn register_command<H>(
        &self,
        name: impl Into<String>,
        help: impl Into<String>,
        handler: H,
    ) -> RegistryResult<()>
    where
        H: Handler + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyCommandName);
        }

        let mut tables = self.tables.write();
        if tables.commands.contains_key(&name) {
            return Err(RegistryError::DuplicateCommand(name));
        }

        let entry = CommandEntry {
            name: name.clone(),
            help: help.into(),
            handler: into_handler(handler),
        };
        tables.commands.insert(name.clone(), Arc::new(entry));
        debug!(command = %name, "Command registered");
        Ok(())
    }

    /// Removes the command `name`. Returns whether a command was removed.
    pub fn unregister_command(&self, name: &str) -> bool {
        let removed = self.tables.write().commands.remove(name).is_some();
        if removed {
            debug!(command = %name, "Command unregistered");
        }
        removed
    }

    /// Registers a matcher for messages whose type intersects `types` and
    /// whose text matches `pattern`.
    ///
    /// The matched text (or that of the first capturing group, if any) is
    /// placed in [`Message::matched`](crate::Message::matched) before the
    /// handler runs. The matcher is appended after all existing ones.
    pub fn register_matcher<H>(
        &self,
        types: MessageType,
        pattern: &str,
        handler: H,
    ) -> RegistryResult<MatcherId>
    where
        H: Handler + 'static,
    {
        let regex = Regex::new(pattern).map_err(|source| RegistryError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;

        let mut tables = self.tables.write();
        let id = MatcherId(self.last_matcher_id.fetch_add(1, Ordering::Relaxed) + 1);
        tables.matchers.push(Arc::new(Matcher {
            id,
            types,
            pattern: regex,
            handler: into_handler(handler),
        }));
        debug!(matcher_id = %id, types = %types, pattern, "Matcher registered");
        Ok(id)
    }

    /// Removes the matcher `id`. Returns whether a matcher was removed.
    pub fn unregister_matcher(&self, id: MatcherId) -> bool {
        let mut tables = self.tables.write();
        let before = tables.matchers.len();
        tables.matchers.retain(|m| m.id != id);
        let removed = tables.matchers.len() != before;
        if removed {
            debug!(matcher_id = %id, "Matcher unregistered");
        }
        removed
    }

    /// Queues a setup function to run once before serving starts.
    pub fn register_setup<F>(&self, name: impl Into<String>, setup: F)
    where
        F: FnOnce(&Registry, &PluginConfig) -> anyhow::Result<()> + Send + 'static,
    {
        self.setups.lock().push((name.into(), Box::new(setup)));
    }

    /// Runs every queued setup function in registration order.
    ///
    /// A failing setup is logged and skipped; it never prevents the others
    /// from running. Setup functions queued while this runs are run too.
    /// Returns the failures.
    pub fn run_setup(&self, config: &PluginConfig) -> Vec<SetupError> {
        let mut failures = Vec::new();
        loop {
            let batch = std::mem::take(&mut *self.setups.lock());
            if batch.is_empty() {
                break;
            }
            for (name, setup) in batch {
                match setup(self, config) {
                    Ok(()) => debug!(setup = %name, "Setup complete"),
                    Err(source) => {
                        let err = SetupError { name, source };
                        error!(error = %err, "Plugin setup failed");
                        failures.push(err);
                    }
                }
            }
        }

        let tables = self.tables.read();
        info!(
            commands = tables.commands.len(),
            matchers = tables.matchers.len(),
            "Plugin setup finished"
        );
        failures
    }

    /// Looks up a command by exact name.
    pub fn command(&self, name: &str) -> Option<Arc<CommandEntry>> {
        self.tables.read().commands.get(name).cloned()
    }

    /// Returns a snapshot of the matchers in evaluation order.
    pub fn matchers(&self) -> Vec<Arc<Matcher>> {
        self.tables.read().matchers.clone()
    }

    /// Returns the registered command names, sorted.
    pub fn command_names(&self) -> Vec<String> {
        self.tables.read().commands.keys().cloned().collect()
    }

    /// Returns the number of registered matchers.
    pub fn matcher_count(&self) -> usize {
        self.tables.read().matchers.len()
    }

    /// Builds the help listing: one `name: help` line per command, sorted by
    /// name, with the help column aligned.
    pub fn help_text(&self) -> String {
        let tables = self.tables.read();
        let width = tables
            .commands
            .keys()
            .map(|name| name.chars().count() + 1)
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for entry in tables.commands.values() {
            let label = format!("{}:", entry.name);
            let line = format!("{label:<width$} {}", entry.help);
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("Registry")
            .field("commands", &tables.commands.len())
            .field("matchers", &tables.matchers.len())
            .field("pending_setups", &self.setups.lock().len())
            .finish()
    }
}
