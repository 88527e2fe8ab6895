use std::collections::HashMap;

use crate::domain::ChatId;

/// What the next plain-text message in a chat is expected to be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionMode {
    #[default]
    None,
    AwaitingChannel,
    AwaitingNewUser,
    AwaitingRemoveChannel,
}

impl SessionMode {
    /// Prompt sent when the mode is armed.
    pub fn prompt(self) -> Option<&'static str> {
        match self {
            SessionMode::None => None,
            SessionMode::AwaitingChannel => Some(
                "Send a link, @username or -100… id, or forward a post from the channel.",
            ),
            SessionMode::AwaitingNewUser => Some("Send the user ID (a number)."),
            SessionMode::AwaitingRemoveChannel => Some("Send the peer_id of the channel to remove."),
        }
    }
}

/// One-shot prompt/response modes, one per chat.
///
/// A mode is armed by a command and consumed by the next plain-text message,
/// whatever the outcome of handling it. Nothing here is persisted, so a
/// restart drops every armed mode.
#[derive(Debug, Default)]
pub struct ModeStateMachine {
    modes: HashMap<ChatId, SessionMode>,
}

impl ModeStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, chat: ChatId) -> SessionMode {
        self.modes.get(&chat).copied().unwrap_or_default()
    }

    /// Arm `mode`, replacing whatever was armed before.
    pub fn arm(&mut self, chat: ChatId, mode: SessionMode) {
        if mode == SessionMode::None {
            self.modes.remove(&chat);
        } else {
            self.modes.insert(chat, mode);
        }
    }

    pub fn cancel(&mut self, chat: ChatId) {
        self.modes.remove(&chat);
    }

    /// Consume the armed mode, leaving `None` behind.
    pub fn take(&mut self, chat: ChatId) -> SessionMode {
        self.modes.remove(&chat).unwrap_or_default()
    }
}
