use async_trait::async_trait;

use crate::{
    domain::{ChatId, ChatInfo, EntityRef, MessageRef},
    errors::ResolveError,
    Result,
};

/// Messenger port consumed by the relay core.
///
/// Lookup/join operations return [`ResolveError`] so the resolver can branch on
/// the failure kind. Inbound events are pushed into
/// [`crate::dispatcher::RelayBot`] by the adapter that owns the connection.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Re-send `message` verbatim to `to`.
    async fn forward_message(&self, to: ChatId, message: MessageRef) -> Result<MessageRef>;

    /// Join a channel. `ResolveError::AlreadyMember` is not a failure for callers.
    async fn join_channel(&self, target: &EntityRef) -> std::result::Result<(), ResolveError>;

    /// Accept a private invite and return the chats it granted access to.
    async fn import_invite(&self, token: &str) -> std::result::Result<Vec<ChatInfo>, ResolveError>;

    async fn get_entity(&self, target: &EntityRef) -> std::result::Result<ChatInfo, ResolveError>;
}
