use crate::{
    domain::{ChannelId, EntityRef},
    errors::ResolveError,
    messaging::{port::MessagingPort, types::ForwardOrigin},
    peer_ref::PeerReference,
};

/// Marker Telegram puts in front of a bare channel id to form its peer id.
pub const CHANNEL_ID_MARKER: &str = "-100";

/// Apply the public-channel encoding to a bare channel id: `777` -> `-100777`.
pub fn canonical_channel_id(bare: i64) -> Option<ChannelId> {
    if bare <= 0 {
        return None;
    }
    format!("{CHANNEL_ID_MARKER}{bare}")
        .parse::<i64>()
        .ok()
        .map(ChannelId)
}

/// Inverse of [`canonical_channel_id`]; `None` for ids without the marker.
pub fn bare_channel_id(channel: ChannelId) -> Option<i64> {
    channel
        .0
        .to_string()
        .strip_prefix(CHANNEL_ID_MARKER)
        .filter(|rest| !rest.is_empty() && !rest.starts_with('0'))
        .and_then(|rest| rest.parse::<i64>().ok())
}

/// Turns typed references and forward origins into canonical channel ids,
/// joining the channel first when the messenger needs that.
pub struct ChannelResolver<'a> {
    messenger: &'a dyn MessagingPort,
}

impl<'a> ChannelResolver<'a> {
    pub fn new(messenger: &'a dyn MessagingPort) -> Self {
        Self { messenger }
    }

    pub async fn resolve(&self, reference: &PeerReference) -> Result<ChannelId, ResolveError> {
        match reference {
            PeerReference::Peer(id) => Ok(ChannelId(*id)),
            PeerReference::Invite(token) => self.resolve_invite(token).await,
            PeerReference::Username(name) => {
                self.join_and_lookup(&EntityRef::Username(name.clone()))
                    .await
            }
        }
    }

    pub async fn resolve_from_forward(
        &self,
        origin: &ForwardOrigin,
    ) -> Result<ChannelId, ResolveError> {
        match origin {
            ForwardOrigin::Channel { channel_id } => canonical_channel_id(*channel_id)
                .ok_or_else(|| {
                    ResolveError::Failed(format!("invalid forwarded channel id {channel_id}"))
                }),
            ForwardOrigin::Sender(entity) => {
                let info = self.messenger.get_entity(entity).await?;
                Ok(ChannelId(info.id))
            }
        }
    }

    /// Title, else username, else the raw id when the lookup fails.
    pub async fn display_name(&self, channel: ChannelId) -> String {
        match self.messenger.get_entity(&EntityRef::Id(channel.0)).await {
            Ok(info) => info.display_name(),
            Err(e) => {
                tracing::debug!(channel = channel.0, "channel lookup failed: {e}");
                channel.to_string()
            }
        }
    }

    async fn resolve_invite(&self, token: &str) -> Result<ChannelId, ResolveError> {
        match self.messenger.import_invite(token).await {
            Ok(chats) => chats
                .first()
                .map(|c| ChannelId(c.id))
                .ok_or_else(|| {
                    ResolveError::Failed("could not join the private channel by invite".to_string())
                }),
            Err(ResolveError::AlreadyMember) => Err(ResolveError::Failed(
                "already a member of this channel; send its id or forward a post instead"
                    .to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    async fn join_and_lookup(&self, target: &EntityRef) -> Result<ChannelId, ResolveError> {
        match self.messenger.join_channel(target).await {
            Ok(()) | Err(ResolveError::AlreadyMember) => {}
            Err(e) => return Err(e),
        }
        let info = self.messenger.get_entity(target).await?;
        Ok(ChannelId(info.id))
    }
}
