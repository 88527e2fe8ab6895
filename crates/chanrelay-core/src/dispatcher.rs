//! Command surface and free-text routing.
//!
//! `RelayBot` is the application context: it owns the subscription registry
//! and the per-chat modes behind one async mutex. The lock is held only while
//! state is read or mutated; lookups and replies run after it is released, so
//! relays never wait on an admin's network round trips.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    domain::{ChannelId, ChatId, UserId},
    errors::Error,
    formatting::{escape_html, help_text, render_list_report},
    messaging::{
        port::MessagingPort,
        types::{ChannelPost, IncomingMessage},
    },
    mode::{ModeStateMachine, SessionMode},
    peer_ref::parse_peer_reference,
    registry::{fan_out, RelayOutcome, SubscriptionRegistry},
    resolver::ChannelResolver,
    security::is_authorized,
    store::ListStore,
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Add,
    Cancel,
    List,
    Help,
    Remove,
    AddUser,
    RemoveUser { args: String },
    Unknown(String),
}

impl BotCommand {
    /// Parse `/cmd[@botname] [args]`.
    ///
    /// Tokens match exactly. Only `/removeuser` takes arguments; any other
    /// command followed by text is unknown. `None` when the command is
    /// addressed to a bot other than `bot_username`.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let (cmd, mention, args) = parse_command(text);

        if let (Some(mention), Some(me)) = (mention.as_deref(), bot_username) {
            if !mention.eq_ignore_ascii_case(me) {
                return None;
            }
        }

        let parsed = match (cmd.as_str(), args.is_empty()) {
            ("removeuser", _) => BotCommand::RemoveUser { args },
            ("add", true) => BotCommand::Add,
            ("cancel", true) => BotCommand::Cancel,
            ("list", true) => BotCommand::List,
            ("help" | "start", true) => BotCommand::Help,
            ("remove", true) => BotCommand::Remove,
            ("adduser", true) => BotCommand::AddUser,
            (_, true) => BotCommand::Unknown(cmd),
            (_, false) => BotCommand::Unknown(format!("{cmd} {args}")),
        };
        Some(parsed)
    }
}

/// Split `/cmd@botname arg1 ...` into the command, the optional mention and the rest.
fn parse_command(text: &str) -> (String, Option<String>, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let token = first.strip_prefix('/').unwrap_or(first);
    let (cmd, mention) = match token.split_once('@') {
        Some((cmd, mention)) => (cmd, Some(mention.to_string())),
        None => (token, None),
    };

    (cmd.to_string(), mention, rest)
}

fn parse_id(text: &str, hint: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| Error::Validation(hint.to_string()))
}

struct RelaySession {
    registry: SubscriptionRegistry,
    modes: ModeStateMachine,
}

/// Work left after the session lock is released.
enum Pending {
    Reply(String),
    List {
        channels: Vec<ChannelId>,
        recipients: Vec<UserId>,
    },
    AddChannel,
}

pub struct RelayBot {
    messenger: Arc<dyn MessagingPort>,
    admins: Vec<UserId>,
    bot_username: Option<String>,
    session: Mutex<RelaySession>,
}

impl RelayBot {
    /// Load the persisted lists. Relay routes are installed by [`RelayBot::bootstrap`].
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        store: Arc<dyn ListStore>,
        admins: Vec<UserId>,
    ) -> Self {
        Self {
            messenger,
            admins,
            bot_username: None,
            session: Mutex::new(RelaySession {
                registry: SubscriptionRegistry::load(store),
                modes: ModeStateMachine::new(),
            }),
        }
    }

    /// Ignore `/cmd@other` commands meant for other bots in the same chat.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Register a relay route for every persisted channel.
    pub async fn bootstrap(&self) -> usize {
        let mut session = self.session.lock().await;
        let registered = session.registry.register_all();
        tracing::info!(
            channels = session.registry.channels().count(),
            recipients = session.registry.recipients().count(),
            "relay routes ready"
        );
        registered
    }

    /// Handle a message sent to the bot. Domain failures become replies; only a
    /// failed reply is returned as an error.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Result<()> {
        let pending = {
            let mut guard = self.session.lock().await;
            let session = &mut *guard;

            if !is_authorized(msg.sender, &self.admins, &session.registry) {
                tracing::debug!(chat = msg.chat_id.0, "ignoring unauthorized sender");
                return Ok(());
            }

            if msg.is_command() {
                match BotCommand::parse(msg.trimmed_text(), self.bot_username.as_deref()) {
                    Some(cmd) => Some(run_command(session, msg.chat_id, cmd)),
                    None => {
                        tracing::debug!(chat = msg.chat_id.0, "command addressed to another bot");
                        None
                    }
                }
            } else {
                consume_mode(session, msg)
            }
        };

        let html = match pending {
            None => return Ok(()),
            Some(Pending::Reply(html)) => html,
            Some(Pending::List {
                channels,
                recipients,
            }) => self.list_report(&channels, &recipients).await,
            Some(Pending::AddChannel) => self
                .add_channel_from(msg)
                .await
                .unwrap_or_else(|e| failure(&e)),
        };

        self.messenger.send_html(msg.chat_id, &html).await?;
        Ok(())
    }

    /// Relay a channel post to every recipient. `None` if the channel has no route.
    pub async fn handle_channel_post(&self, post: ChannelPost) -> Option<RelayOutcome> {
        let targets = {
            let session = self.session.lock().await;
            session.registry.relay_targets(post.channel)
        };
        let Some(targets) = targets else {
            tracing::debug!(channel = post.channel.0, "no relay route for channel");
            return None;
        };
        Some(fan_out(self.messenger.as_ref(), post.channel, post.message, &targets).await)
    }

    pub async fn channels(&self) -> Vec<ChannelId> {
        self.session.lock().await.registry.channels().collect()
    }

    pub async fn recipients(&self) -> Vec<UserId> {
        self.session.lock().await.registry.recipients().collect()
    }

    pub async fn mode(&self, chat: ChatId) -> SessionMode {
        self.session.lock().await.modes.current(chat)
    }

    pub async fn is_registered(&self, channel: ChannelId) -> bool {
        self.session.lock().await.registry.is_registered(channel)
    }

    /// Resolve without the lock, then take it only for the insert.
    async fn add_channel_from(&self, msg: &IncomingMessage) -> Result<String> {
        let resolver = ChannelResolver::new(self.messenger.as_ref());

        let (channel, via) = match &msg.forward {
            Some(origin) => (
                resolver.resolve_from_forward(origin).await?,
                "forwarded message",
            ),
            None => {
                let text = msg.trimmed_text();
                if text.is_empty() {
                    return Err(Error::Validation(
                        "Could not determine the channel. Forward a post from it or send a link."
                            .to_string(),
                    ));
                }
                (resolver.resolve(&parse_peer_reference(text)).await?, "link")
            }
        };

        self.session.lock().await.registry.add_channel(channel)?;
        let name = resolver.display_name(channel).await;
        Ok(format!("✅ Channel «{}» added by {via}.", escape_html(&name)))
    }

    async fn list_report(&self, channels: &[ChannelId], recipients: &[UserId]) -> String {
        let resolver = ChannelResolver::new(self.messenger.as_ref());
        let mut named = Vec::with_capacity(channels.len());
        for id in channels {
            named.push((*id, resolver.display_name(*id).await));
        }
        render_list_report(&named, recipients)
    }
}

fn run_command(session: &mut RelaySession, chat: ChatId, cmd: BotCommand) -> Pending {
    let reply = match cmd {
        BotCommand::Add => arm(session, chat, SessionMode::AwaitingChannel),
        BotCommand::AddUser => arm(session, chat, SessionMode::AwaitingNewUser),
        BotCommand::Remove => {
            if !session.registry.has_channels() {
                return Pending::Reply("The channel list is empty.".to_string());
            }
            arm(session, chat, SessionMode::AwaitingRemoveChannel)
        }
        BotCommand::Cancel => {
            session.modes.cancel(chat);
            "Input mode cancelled.".to_string()
        }
        BotCommand::Help => help_text().to_string(),
        BotCommand::List => {
            return Pending::List {
                channels: session.registry.channels().collect(),
                recipients: session.registry.recipients().collect(),
            }
        }
        BotCommand::RemoveUser { args } => {
            let first = args.split_whitespace().next().unwrap_or("");
            let result = parse_id(first, "Usage: /removeuser <ID>").and_then(|id| {
                session.registry.remove_user(UserId(id))?;
                Ok(format!("🗑 User <code>{id}</code> removed."))
            });
            result.unwrap_or_else(|e| failure(&e))
        }
        BotCommand::Unknown(name) => format!(
            "Unknown command: /{}. Send /help for the list.",
            escape_html(&name)
        ),
    };
    Pending::Reply(reply)
}

/// Route free text to the armed mode, consuming it whatever the outcome.
fn consume_mode(session: &mut RelaySession, msg: &IncomingMessage) -> Option<Pending> {
    let text = msg.trimmed_text();
    let result = match session.modes.take(msg.chat_id) {
        SessionMode::None => {
            tracing::debug!(chat = msg.chat_id.0, "ignoring free text without a prompt");
            return None;
        }
        SessionMode::AwaitingChannel => return Some(Pending::AddChannel),
        SessionMode::AwaitingNewUser => parse_id(text, "Send a number (ID).").and_then(|id| {
            session.registry.add_user(UserId(id))?;
            Ok(format!("✅ User <code>{id}</code> added."))
        }),
        SessionMode::AwaitingRemoveChannel => {
            parse_id(text, "Send a number (peer_id).").and_then(|id| {
                session.registry.remove_channel(ChannelId(id))?;
                Ok(format!("🗑 Channel <code>{id}</code> removed."))
            })
        }
    };
    Some(Pending::Reply(result.unwrap_or_else(|e| failure(&e))))
}

fn arm(session: &mut RelaySession, chat: ChatId, mode: SessionMode) -> String {
    session.modes.arm(chat, mode);
    mode.prompt().map(escape_html).unwrap_or_default()
}

fn failure(e: &Error) -> String {
    if matches!(e, Error::Io(_) | Error::External(_) | Error::Config(_)) {
        tracing::warn!("command failed: {e}");
    }
    format!("❌ {}", escape_html(&e.user_message()))
}
