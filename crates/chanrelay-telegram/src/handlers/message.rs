use teloxide::types::Message;

use chanrelay_core::{
    domain::{ChannelId, ChatId, EntityRef, UserId},
    messaging::types::{ForwardOrigin, IncomingMessage},
    resolver::bare_channel_id,
};

pub(crate) fn incoming_message(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        sender: msg.from().map(|u| UserId(u.id.0 as i64)),
        text: msg.text().or_else(|| msg.caption()).map(str::to_string),
        forward: forward_origin(msg),
    }
}

/// Forwards from hidden users carry no usable origin and read as plain text.
fn forward_origin(msg: &Message) -> Option<ForwardOrigin> {
    if let Some(chat) = msg.forward_from_chat() {
        return Some(origin_for_chat(chat.id.0));
    }
    msg.forward_from_user()
        .map(|u| ForwardOrigin::Sender(EntityRef::Id(u.id.0 as i64)))
}

/// Bot API chat ids already carry the `-100` marker; strip it so the core
/// rebuilds the canonical id the same way for every origin.
fn origin_for_chat(chat_id: i64) -> ForwardOrigin {
    match bare_channel_id(ChannelId(chat_id)) {
        Some(bare) => ForwardOrigin::Channel { channel_id: bare },
        None => ForwardOrigin::Sender(EntityRef::Id(chat_id)),
    }
}
