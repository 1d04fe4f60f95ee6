//! Table (and text) flipping.
//!
//! `flip` with no arguments flips a table; otherwise the text is lowercased,
//! reversed and mapped to upside-down look-alikes.
//!
//! ```toml
//! [plugins.flip]
//! flipper = "(ノಠ益ಠ)ノ彡 "
//! ```

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use bort_core::{Message, OutboxSender, PluginConfig, Registry, RegistryResult};
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

pub const TABLE: &str = "┻━┻";
pub const DEFAULT_FLIPPER: &str = "(ノಠ益ಠ)ノ彡 ";

const PAIRS: &[(char, char)] = &[
    ('a', 'ɐ'),
    ('b', 'q'),
    ('c', 'ɔ'),
    ('d', 'p'),
    ('e', 'ǝ'),
    ('f', 'ɟ'),
    ('g', 'ƃ'),
    ('h', 'ɥ'),
    ('i', 'ı'),
    ('j', 'ɾ'),
    ('k', 'ʞ'),
    ('l', 'ʃ'),
    ('m', 'ɯ'),
    ('n', 'u'),
    ('r', 'ɹ'),
    ('t', 'ʇ'),
    ('v', 'ʌ'),
    ('w', 'ʍ'),
    ('y', 'ʎ'),
    ('.', '˙'),
    ('[', ']'),
    ('(', ')'),
    ('{', '}'),
    ('?', '¿'),
    ('!', '¡'),
    ('\'', ','),
    ('<', '>'),
    ('_', '‾'),
    ('&', '⅋'),
    (';', '؛'),
    ('"', '„'),
];

/// Both directions of every pair.
static FLIP_TABLE: LazyLock<HashMap<char, char>> = LazyLock::new(|| {
    PAIRS
        .iter()
        .flat_map(|&(a, b)| [(a, b), (b, a)])
        .collect()
});

#[derive(Debug, Deserialize)]
struct FlipConfig {
    flipper: String,
}

/// Turns `text` upside down.
pub fn flip(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .rev()
        .map(|c| FLIP_TABLE.get(&c).copied().unwrap_or(c))
        .collect()
}

/// Registers the `flip` command and its setup.
pub fn register(registry: &Registry, _outbox: OutboxSender) -> RegistryResult<()> {
    let flipper = Arc::new(RwLock::new(DEFAULT_FLIPPER.to_string()));

    let handler_flipper = Arc::clone(&flipper);
    registry.register_command(
        "flip",
        "flip text (or tables by default)",
        move |msg: Message| {
            let flipper = handler_flipper.read().clone();
            async move {
                let flipped = if msg.args.is_empty() {
                    TABLE.to_string()
                } else {
                    flip(&msg.args)
                };
                Ok::<_, anyhow::Error>(msg.reply(flipper + &flipped))
            }
        },
    )?;

    registry.register_setup("flip", move |_, config: &PluginConfig| {
        if let Some(section) = config.section::<FlipConfig>("flip")? {
            debug!(flipper = %section.flipper, "Using configured flipper");
            *flipper.write() = section.flipper;
        }
        Ok(())
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bort_core::{Engine, MessageType, Outbox};
    use serde_json::json;

    fn flip_command(args: &str) -> Message {
        Message {
            command: Some("flip".into()),
            args: args.into(),
            nick: "alice".into(),
            ..Message::new(MessageType::PRIV_MSG, "#bort", args)
        }
    }

    #[test]
    fn test_flip_text() {
        assert_eq!(flip("Hello"), "oʃʃǝɥ");
        assert_eq!(flip("(bp)"), "(dq)");
        assert_eq!(flip("oʃʃǝɥ"), "hello");
    }

    #[tokio::test]
    async fn test_flip_through_engine() {
        let registry = Arc::new(Registry::new());
        let outbox = Arc::new(Outbox::new(2));
        register(&registry, outbox.sender()).unwrap();
        let engine = Engine::new(Arc::clone(&registry), outbox);

        let dispatch = engine.process(flip_command("")).await;
        assert!(dispatch.is_ok());
        assert_eq!(dispatch.replies.len(), 1);
        assert_eq!(dispatch.replies[0].kind, MessageType::PRIV_MSG);
        assert_eq!(dispatch.replies[0].context, "#bort");
        assert_eq!(dispatch.replies[0].text, "(ノಠ益ಠ)ノ彡 ┻━┻");

        let dispatch = engine.process(flip_command("hello")).await;
        assert_eq!(dispatch.replies[0].text, "(ノಠ益ಠ)ノ彡 oʃʃǝɥ");
    }

    #[tokio::test]
    async fn test_configured_flipper() {
        let registry = Arc::new(Registry::new());
        let outbox = Arc::new(Outbox::new(2));
        register(&registry, outbox.sender()).unwrap();
        assert!(
            registry
                .run_setup(&PluginConfig::new(json!({ "flip": { "flipper": "(╯°□°)╯︵ " } })))
                .is_empty()
        );

        let engine = Engine::new(registry, outbox);
        let dispatch = engine.process(flip_command("")).await;
        assert_eq!(dispatch.replies[0].text, "(╯°□°)╯︵ ┻━┻");
    }
}
