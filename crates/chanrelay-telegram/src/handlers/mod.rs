//! Telegram update handlers.
//!
//! Each handler is a thin adapter that converts a teloxide `Message` into the
//! core's inbound model and hands it to `RelayBot`. Failures are logged here;
//! the dispatcher never sees an error from a handler.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod channel_post;
mod message;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let incoming = message::incoming_message(&msg);
    if let Err(e) = state.relay.handle_message(&incoming).await {
        tracing::warn!(chat = msg.chat.id.0, "failed to handle message: {e}");
    }
    Ok(())
}

pub async fn handle_channel_post(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let post = channel_post::channel_post(&msg);
    if let Some(outcome) = state.relay.handle_channel_post(post).await {
        tracing::debug!(
            channel = post.channel.0,
            delivered = outcome.delivered.len(),
            failed = outcome.failed.len(),
            "relayed channel post"
        );
    }
    Ok(())
}
