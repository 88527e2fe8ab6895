use crate::domain::{ChannelId, ChatId, EntityRef, MessageRef, UserId};

/// Where a forwarded message originally came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForwardOrigin {
    /// Bare channel id as carried in forward headers (no `-100` marker).
    Channel { channel_id: i64 },
    /// Opaque sender reference that has to be looked up through the messenger.
    Sender(EntityRef),
}

/// A message delivered to the bot in a chat with a user.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub sender: Option<UserId>,
    /// Message text, or the caption for media messages.
    pub text: Option<String>,
    pub forward: Option<ForwardOrigin>,
}

impl IncomingMessage {
    pub fn trimmed_text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or("")
    }

    /// Commands are typed, never forwarded.
    pub fn is_command(&self) -> bool {
        self.forward.is_none() && self.trimmed_text().starts_with('/')
    }
}

/// A new post published in a channel the bot can see.
#[derive(Clone, Copy, Debug)]
pub struct ChannelPost {
    pub channel: ChannelId,
    pub message: MessageRef,
}
