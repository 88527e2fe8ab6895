//! Telegram adapter (teloxide).
//!
//! This crate implements the `chanrelay-core` MessagingPort over the Telegram
//! Bot API and feeds updates into the core dispatcher.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ParseMode, Recipient},
    ApiError, RequestError,
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use chanrelay_core::{
    domain::{ChatId, ChatInfo, EntityRef, MessageId, MessageRef},
    errors::{Error, ResolveError},
    messaging::port::MessagingPort,
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn recipient(target: &EntityRef) -> Recipient {
        match target {
            EntityRef::Id(id) => Recipient::Id(teloxide::types::ChatId(*id)),
            EntityRef::Username(name) => {
                Recipient::ChannelUsername(format!("@{}", name.trim_start_matches('@')))
            }
        }
    }

    fn map_err(e: RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(
        &self,
        mut op: impl FnMut() -> Fut,
    ) -> std::result::Result<T, RequestError>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    sleep(d).await;
                }
                Err(other) => return Err(other),
            }
        }
    }

    async fn lookup(&self, target: &EntityRef) -> std::result::Result<ChatInfo, ResolveError> {
        let chat = self
            .with_retry(|| self.bot.get_chat(Self::recipient(target)))
            .await
            .map_err(|e| map_lookup_err(target, e))?;
        Ok(ChatInfo {
            id: chat.id.0,
            title: chat.title().map(str::to_string),
            username: chat.username().map(str::to_string),
        })
    }
}

/// `getChat` failures: unknown chats and chats the bot was removed from are
/// "not found"; anything else is a generic failure.
fn map_lookup_err(target: &EntityRef, e: RequestError) -> ResolveError {
    match e {
        RequestError::Api(ApiError::ChatNotFound) | RequestError::Api(ApiError::BotKicked) => {
            ResolveError::NotFound(target.to_string())
        }
        other => ResolveError::Failed(format!("telegram error: {other}")),
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn forward_message(&self, to: ChatId, message: MessageRef) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot.forward_message(
                    Self::tg_chat(to),
                    Self::tg_chat(message.chat_id),
                    Self::tg_msg_id(message.message_id),
                )
            })
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            chat_id: to,
            message_id: MessageId(msg.id.0),
        })
    }

    /// Bots cannot join channels themselves; an admin adds the bot. Reachability
    /// is checked by the `get_entity` lookup that follows, so this makes no call.
    async fn join_channel(&self, target: &EntityRef) -> std::result::Result<(), ResolveError> {
        tracing::debug!(%target, "bot accounts cannot join; relying on lookup");
        Ok(())
    }

    async fn import_invite(&self, _token: &str) -> std::result::Result<Vec<ChatInfo>, ResolveError> {
        Err(ResolveError::Failed(
            "bots cannot join by invite link; add the bot to the channel, then send its -100… id or forward a post"
                .to_string(),
        ))
    }

    async fn get_entity(&self, target: &EntityRef) -> std::result::Result<ChatInfo, ResolveError> {
        self.lookup(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_become_channel_recipients() {
        let r = TelegramMessenger::recipient(&EntityRef::Username("rust_news".to_string()));
        assert_eq!(r, Recipient::ChannelUsername("@rust_news".to_string()));

        let r = TelegramMessenger::recipient(&EntityRef::Id(-100777));
        assert_eq!(r, Recipient::Id(teloxide::types::ChatId(-100777)));
    }

    #[test]
    fn missing_chats_map_to_not_found() {
        let target = EntityRef::Username("ghost".to_string());
        let err = map_lookup_err(&target, RequestError::Api(ApiError::ChatNotFound));
        assert_eq!(err, ResolveError::NotFound("@ghost".to_string()));

        let err = map_lookup_err(
            &target,
            RequestError::Api(ApiError::Unknown("Bad Request: oops".to_string())),
        );
        assert!(matches!(err, ResolveError::Failed(_)));
    }

    #[tokio::test]
    async fn joining_makes_no_request() {
        let messenger = TelegramMessenger::new(Bot::new("0:offline"));
        let target = EntityRef::Username("rust_news".to_string());
        assert_eq!(messenger.join_channel(&target).await, Ok(()));
    }
}
