//! Canned retorts to watched phrases.
//!
//! Each key of `[plugins.heckle]` is a regular expression; the value is the
//! retort, with `%m` replaced by the matched text.
//!
//! ```toml
//! [plugins.heckle]
//! "(?i)\\bbort\\b" = "who, %m?"
//! ```

use std::collections::BTreeMap;

use bort_core::{Message, MessageType, OutboxSender, PluginConfig, Registry, RegistryResult};
use tracing::{debug, warn};

/// Placeholder for the matched text.
pub const MATCH_PLACEHOLDER: &str = "%m";

/// Fills the placeholder in `retort`.
pub fn render(retort: &str, matched: &str) -> String {
    retort.replace(MATCH_PLACEHOLDER, matched)
}

pub fn register(registry: &Registry, _outbox: OutboxSender) -> RegistryResult<()> {
    registry.register_setup("heckle", setup);
    Ok(())
}

fn setup(registry: &Registry, config: &PluginConfig) -> anyhow::Result<()> {
    let Some(retorts) = config.section::<BTreeMap<String, String>>("heckle")? else {
        return Ok(());
    };

    for (watch, retort) in retorts {
        let handler = move |msg: Message| {
            let text = render(&retort, &msg.matched);
            async move { Ok::<_, anyhow::Error>(msg.reply(text)) }
        };
        match registry.register_matcher(MessageType::PRIV_MSG, &watch, handler) {
            Ok(id) => debug!(matcher_id = %id, watch = %watch, "Heckle registered"),
            Err(e) => warn!(watch = %watch, error = %e, "Skipping heckle"),
        }
    }
    Ok(())
}
