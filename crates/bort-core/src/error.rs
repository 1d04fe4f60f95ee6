//! Error types for the bort core engine.

use std::fmt;

use thiserror::Error;

use crate::registry::MatcherId;

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors returned synchronously to a plugin while it registers handlers.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Command names must be non-empty.
    #[error("cannot register empty command name")]
    EmptyCommandName,

    /// A command with this name is already registered.
    #[error("{0}: command already registered")]
    DuplicateCommand(String),

    /// The matcher pattern does not compile.
    #[error("invalid matcher pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },
}

// =============================================================================
// Outbox Errors
// =============================================================================

/// Errors returned by [`Outbox::push`](crate::outbox::Outbox::push).
///
/// `Full` is expected backpressure: callers may drop the message or retry
/// later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutboxError {
    /// The outbox is at capacity.
    #[error("outbox full")]
    Full,

    /// The outbox has been dropped.
    #[error("outbox closed")]
    Closed,
}

// =============================================================================
// Setup Errors
// =============================================================================

/// A plugin setup function failed.
#[derive(Debug, Error)]
#[error("setup '{name}' failed: {source}")]
pub struct SetupError {
    /// Name the setup function was registered under.
    pub name: String,
    /// Underlying failure.
    #[source]
    pub source: anyhow::Error,
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// A single matcher handler that failed during dispatch.
#[derive(Debug, Clone)]
pub struct MatcherFailure {
    /// The failing matcher.
    pub matcher: MatcherId,
    /// Error message reported by the handler.
    pub reason: String,
}

impl fmt::Display for MatcherFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matcher {}: {}", self.matcher, self.reason)
    }
}

/// Handler failures reported alongside the replies of a dispatch.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The command handler failed.
    #[error("{command}: {reason}")]
    Command {
        /// Command name.
        command: String,
        /// Error message reported by the handler.
        reason: String,
    },

    /// One or more matcher handlers failed. Displays one line per failure.
    #[error("{}", join_lines(.0))]
    Matchers(Vec<MatcherFailure>),
}

fn join_lines(failures: &[MatcherFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for registration operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
