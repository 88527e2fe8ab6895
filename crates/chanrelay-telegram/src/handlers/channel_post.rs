use teloxide::types::Message;

use chanrelay_core::{
    domain::{ChannelId, ChatId, MessageId, MessageRef},
    messaging::types::ChannelPost,
};

pub(crate) fn channel_post(msg: &Message) -> ChannelPost {
    ChannelPost {
        channel: ChannelId(msg.chat.id.0),
        message: MessageRef {
            chat_id: ChatId(msg.chat.id.0),
            message_id: MessageId(msg.id.0),
        },
    }
}
