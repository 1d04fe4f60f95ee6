//! Dispatch engine.
//!
//! The [`Engine`] applies a [`Registry`] to one inbound message and collects
//! the replies. Routing happens in three tiers:
//!
//! 1. `help` is answered by the engine itself, privately to the sender.
//! 2. A registered command is exclusive: its handler runs once and no matcher
//!    is consulted.
//! 3. Otherwise every eligible matcher runs, in registration order. Matchers
//!    are cooperative, so a failing matcher does not suppress the output of
//!    the others; failures are reported together after all have run.

use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, Level, debug, span, warn};

use crate::error::{DispatchError, MatcherFailure};
use crate::handler::Handler;
use crate::message::{Message, MessageType};
use crate::outbox::Outbox;
use crate::registry::Registry;

/// Name of the built-in help command.
pub const HELP_COMMAND: &str = "help";

/// The outcome of dispatching one message.
///
/// Replies produced before or alongside a failure are still returned.
#[derive(Debug, Default)]
pub struct Dispatch {
    /// Replies in the order they were produced.
    pub replies: Vec<Message>,
    /// Handler failures, if any.
    pub error: Option<DispatchError>,
}

impl Dispatch {
    /// A dispatch that produced the given replies without error.
    pub fn ok(replies: Vec<Message>) -> Self {
        Self {
            replies,
            error: None,
        }
    }

    /// Returns `true` if no handler failed.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The dispatch engine of the plugin process.
///
/// Cloning is cheap; clones share the registry and outbox.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    outbox: Arc<Outbox>,
}

impl Engine {
    /// Creates an engine over a registry and outbox.
    pub fn new(registry: Arc<Registry>, outbox: Arc<Outbox>) -> Self {
        Self { registry, outbox }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns the outbox.
    pub fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }

    /// Drains the messages plugins pushed since the last pull.
    pub fn pull(&self) -> Vec<Message> {
        self.outbox.pull()
    }

    /// Routes one inbound message and returns the replies.
    pub async fn process(&self, msg: Message) -> Dispatch {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            kind = %msg.kind,
            context = %msg.context,
            command = msg.command.as_deref().unwrap_or(""),
        );
        self.route(msg).instrument(span).await
    }

    async fn route(&self, msg: Message) -> Dispatch {
        if msg.command() == Some(HELP_COMMAND) {
            debug!("Answering help request");
            let reply = Message::new(MessageType::PRIV_MSG, msg.sender(), self.registry.help_text());
            return Dispatch::ok(vec![reply]);
        }

        if let Some(name) = msg.command()
            && let Some(entry) = self.registry.command(name)
        {
            return self.run_command(entry.name(), entry.handler(), msg).await;
        }

        self.run_matchers(msg).await
    }

    async fn run_command(
        &self,
        name: &str,
        handler: &dyn Handler,
        msg: Message,
    ) -> Dispatch {
        debug!(command = %name, "Running command handler");
        let context = msg.context.clone();
        match handler.handle(msg).await {
            Ok(out) => Dispatch::ok(finish(out, &context).into_iter().collect()),
            Err(e) => {
                warn!(command = %name, error = %e, "Command handler failed");
                Dispatch {
                    replies: Vec::new(),
                    error: Some(DispatchError::Command {
                        command: name.to_owned(),
                        reason: e.to_string(),
                    }),
                }
            }
        }
    }

    async fn run_matchers(&self, msg: Message) -> Dispatch {
        let mut replies = Vec::new();
        let mut failures = Vec::new();

        for matcher in self.registry.matchers() {
            if !matcher.accepts(msg.kind) {
                continue;
            }
            let Some(matched) = matcher.capture(&msg.text) else {
                continue;
            };

            debug!(matcher_id = %matcher.id(), matched = %matched, "Matcher fired");
            let mut input = msg.clone();
            input.matched = matched;

            match matcher.handler().handle(input).await {
                Ok(out) => replies.extend(finish(out, &msg.context)),
                Err(e) => {
                    warn!(matcher_id = %matcher.id(), error = %e, "Matcher handler failed");
                    failures.push(MatcherFailure {
                        matcher: matcher.id(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Dispatch {
            replies,
            error: (!failures.is_empty()).then_some(DispatchError::Matchers(failures)),
        }
    }
}

/// Drops `NONE` outputs and fills in the inbound context when the handler
/// left it empty.
fn finish(mut out: Message, context: &str) -> Option<Message> {
    if out.kind.is_none() {
        return None;
    }
    if out.context.is_empty() {
        out.context = context.to_owned();
    }
    Some(out)
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("outbox", &self.outbox)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HandlerResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine() -> Engine {
        Engine::new(Arc::new(Registry::new()), Arc::new(Outbox::new(8)))
    }

    fn privmsg(context: &str, text: &str) -> Message {
        let mut msg = Message::new(MessageType::PRIV_MSG, context, text);
        msg.nick = "alice".into();
        msg
    }

    fn command(context: &str, name: &str, args: &str) -> Message {
        let mut msg = privmsg(context, "");
        msg.command = Some(name.into());
        msg.args = args.into();
        msg
    }

    async fn shout(msg: Message) -> HandlerResult {
        Ok(msg.reply(msg.args.to_uppercase()))
    }

    async fn echo_match(msg: Message) -> HandlerResult {
        Ok(msg.reply(format!("saw {}", msg.matched)))
    }

    async fn silent(_msg: Message) -> HandlerResult {
        Ok(Message::none())
    }

    async fn broken(_msg: Message) -> HandlerResult {
        anyhow::bail!("boom")
    }

    #[tokio::test]
    async fn test_help_is_private_and_sorted() {
        let engine = engine();
        engine.registry().register_command("zap", "zap things", shout).unwrap();
        engine.registry().register_command("ask", "ask things", shout).unwrap();

        let dispatch = engine.process(command("#room", "help", "")).await;
        assert!(dispatch.is_ok());
        assert_eq!(dispatch.replies.len(), 1);

        let reply = &dispatch.replies[0];
        assert_eq!(reply.kind, MessageType::PRIV_MSG);
        assert_eq!(reply.context, "alice");
        assert_eq!(reply.text, "ask: ask things\nzap: zap things\n");
    }

    #[tokio::test]
    async fn test_help_skips_registered_help_command_and_matchers() {
        let engine = engine();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        engine
            .registry()
            .register_matcher(MessageType::ALL, "", move |msg: Message| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(msg.reply("matched"))
                }
            })
            .unwrap();

        let dispatch = engine.process(command("#room", "help", "")).await;
        assert_eq!(dispatch.replies.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_command_is_exclusive() {
        let engine = engine();
        engine.registry().register_command("shout", "", shout).unwrap();
        engine
            .registry()
            .register_matcher(MessageType::ALL, "", echo_match)
            .unwrap();

        let dispatch = engine.process(command("#room", "shout", "hey")).await;
        assert!(dispatch.is_ok());
        assert_eq!(dispatch.replies.len(), 1);
        assert_eq!(dispatch.replies[0].text, "HEY");
        assert_eq!(dispatch.replies[0].context, "#room");
    }

    #[tokio::test]
    async fn test_command_error_is_returned() {
        let engine = engine();
        engine.registry().register_command("fail", "", broken).unwrap();

        let dispatch = engine.process(command("#room", "fail", "")).await;
        assert!(dispatch.replies.is_empty());
        match dispatch.error {
            Some(DispatchError::Command { command, reason }) => {
                assert_eq!(command, "fail");
                assert_eq!(reason, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_none_output_is_dropped() {
        let engine = engine();
        engine.registry().register_command("quiet", "", silent).unwrap();

        let dispatch = engine.process(command("#room", "quiet", "")).await;
        assert!(dispatch.is_ok());
        assert!(dispatch.replies.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_falls_through_to_matchers() {
        let engine = engine();
        engine
            .registry()
            .register_matcher(MessageType::PRIV_MSG, "nope", echo_match)
            .unwrap();

        let mut msg = command("#room", "nope", "");
        msg.text = "bort: nope".into();
        let dispatch = engine.process(msg).await;
        assert_eq!(dispatch.replies.len(), 1);
        assert_eq!(dispatch.replies[0].text, "saw nope");
    }

    #[tokio::test]
    async fn test_type_mask_filters_matchers() {
        let engine = engine();
        engine
            .registry()
            .register_matcher(MessageType::PRIV_MSG, "hello", echo_match)
            .unwrap();
        engine
            .registry()
            .register_matcher(MessageType::ALL, "hello", echo_match)
            .unwrap();

        let join = Message::new(MessageType::JOIN, "#room", "hello");
        let dispatch = engine.process(join).await;
        assert_eq!(dispatch.replies.len(), 1);

        let dispatch = engine.process(privmsg("#room", "hello")).await;
        assert_eq!(dispatch.replies.len(), 2);
    }

    #[tokio::test]
    async fn test_match_uses_first_group_or_whole_match() {
        let engine = engine();
        engine
            .registry()
            .register_matcher(MessageType::PRIV_MSG, r"weather in (\w+)", echo_match)
            .unwrap();
        engine
            .registry()
            .register_matcher(MessageType::PRIV_MSG, r"in \w+", echo_match)
            .unwrap();

        let dispatch = engine.process(privmsg("#room", "weather in paris")).await;
        let texts: Vec<_> = dispatch.replies.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["saw paris", "saw in paris"]);
    }

    #[tokio::test]
    async fn test_matcher_failure_does_not_suppress_others() {
        let engine = engine();
        let failing = engine
            .registry()
            .register_matcher(MessageType::PRIV_MSG, "http", broken)
            .unwrap();
        engine
            .registry()
            .register_matcher(MessageType::PRIV_MSG, "http", echo_match)
            .unwrap();
        engine
            .registry()
            .register_matcher(MessageType::PRIV_MSG, "http", broken)
            .unwrap();

        let dispatch = engine.process(privmsg("#room", "see http://x")).await;
        assert_eq!(dispatch.replies.len(), 1);
        assert_eq!(dispatch.replies[0].text, "saw http");

        let Some(DispatchError::Matchers(failures)) = &dispatch.error else {
            panic!("expected matcher failures");
        };
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].matcher, failing);
        let text = dispatch.error.as_ref().unwrap().to_string();
        assert_eq!(text.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_two_matchers_reply_in_registration_order() {
        let engine = engine();
        for label in ["first", "second"] {
            engine
                .registry()
                .register_matcher(MessageType::PRIV_MSG, "ping", move |msg: Message| async move {
                    Ok::<_, anyhow::Error>(msg.reply(label))
                })
                .unwrap();
        }

        let dispatch = engine.process(privmsg("#room", "ping")).await;
        let texts: Vec<_> = dispatch.replies.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_handler_context_override_is_kept() {
        let engine = engine();
        engine
            .registry()
            .register_command("whisper", "", |msg: Message| async move {
                Ok::<_, anyhow::Error>(msg.reply_private("secret"))
            })
            .unwrap();

        let dispatch = engine.process(command("#room", "whisper", "")).await;
        assert_eq!(dispatch.replies[0].context, "alice");
    }

    #[tokio::test]
    async fn test_empty_reply_context_inherits_inbound() {
        let engine = engine();
        engine
            .registry()
            .register_command("bare", "", |_msg: Message| async move {
                Ok::<_, anyhow::Error>(Message::new(MessageType::ACTION, "", "waves"))
            })
            .unwrap();

        let dispatch = engine.process(command("#room", "bare", "")).await;
        assert_eq!(dispatch.replies[0].context, "#room");
        assert_eq!(dispatch.replies[0].kind, MessageType::ACTION);
    }

    #[tokio::test]
    async fn test_unregister_during_dispatch_is_safe() {
        let engine = engine();
        let registry = Arc::clone(engine.registry());
        let id_slot = Arc::new(parking_lot::Mutex::new(None));
        let slot = Arc::clone(&id_slot);
        let id = engine
            .registry()
            .register_matcher(MessageType::PRIV_MSG, "once", move |msg: Message| {
                let registry = Arc::clone(&registry);
                let slot = Arc::clone(&slot);
                async move {
                    if let Some(id) = *slot.lock() {
                        registry.unregister_matcher(id);
                    }
                    Ok::<_, anyhow::Error>(msg.reply("only once"))
                }
            })
            .unwrap();
        *id_slot.lock() = Some(id);

        let first = engine.process(privmsg("#room", "once")).await;
        assert_eq!(first.replies.len(), 1);
        let second = engine.process(privmsg("#room", "once")).await;
        assert!(second.replies.is_empty());
    }

    #[test]
    fn test_pull_drains_outbox() {
        let engine = engine();
        engine.outbox().push(privmsg("#room", "pushed")).unwrap();
        let pulled = engine.pull();
        assert_eq!(pulled.len(), 1);
        assert!(engine.pull().is_empty());
    }
}
