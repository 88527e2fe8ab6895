use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use crate::{
    domain::{ChannelId, MessageRef, UserId},
    errors::Error,
    messaging::port::MessagingPort,
    store::{ListName, ListStore},
    Result,
};

/// Relayed channels, recipients and the live relay routes.
///
/// A channel has a route iff it is in the channel list; routes are rebuilt
/// from the list by [`SubscriptionRegistry::register_all`] at startup.
pub struct SubscriptionRegistry {
    store: Arc<dyn ListStore>,
    channels: BTreeSet<ChannelId>,
    recipients: BTreeSet<UserId>,
    routes: HashSet<ChannelId>,
}

/// Result of relaying one post.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelayOutcome {
    pub delivered: Vec<UserId>,
    pub failed: Vec<UserId>,
}

impl SubscriptionRegistry {
    /// Load both lists. No routes are registered yet.
    pub fn load(store: Arc<dyn ListStore>) -> Self {
        let channels = store
            .load(ListName::Channels)
            .into_iter()
            .map(ChannelId)
            .collect();
        let recipients = store
            .load(ListName::Users)
            .into_iter()
            .map(UserId)
            .collect();
        Self {
            store,
            channels,
            recipients,
            routes: HashSet::new(),
        }
    }

    /// Register a route for every listed channel, in ascending order.
    pub fn register_all(&mut self) -> usize {
        let channels: Vec<ChannelId> = self.channels.iter().copied().collect();
        channels
            .into_iter()
            .filter(|c| self.register_channel(*c))
            .count()
    }

    /// Install the relay route for `channel`. Returns `false` if it already had one.
    pub fn register_channel(&mut self, channel: ChannelId) -> bool {
        if !self.routes.insert(channel) {
            return false;
        }
        tracing::info!(channel = channel.0, "subscribed to channel");
        true
    }

    pub fn add_channel(&mut self, channel: ChannelId) -> Result<()> {
        if self.channels.contains(&channel) {
            return Err(Error::Duplicate(format!("Channel already added ({channel})")));
        }
        self.channels.insert(channel);
        self.register_channel(channel);
        tracing::info!(channel = channel.0, "channel added");
        self.persist_channels()
    }

    pub fn remove_channel(&mut self, channel: ChannelId) -> Result<()> {
        if !self.channels.remove(&channel) {
            return Err(Error::NotFound("No such channel.".to_string()));
        }
        if self.routes.remove(&channel) {
            tracing::info!(channel = channel.0, "unsubscribed from channel");
        }
        tracing::info!(channel = channel.0, "channel removed");
        self.persist_channels()
    }

    pub fn add_user(&mut self, user: UserId) -> Result<()> {
        if !self.recipients.insert(user) {
            return Err(Error::Duplicate(format!("User {user} is already a recipient.")));
        }
        tracing::info!(user = user.0, "recipient added");
        self.persist_users()
    }

    pub fn remove_user(&mut self, user: UserId) -> Result<()> {
        if !self.recipients.remove(&user) {
            return Err(Error::NotFound("No such user.".to_string()));
        }
        tracing::info!(user = user.0, "recipient removed");
        self.persist_users()
    }

    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.iter().copied()
    }

    pub fn recipients(&self) -> impl Iterator<Item = UserId> + '_ {
        self.recipients.iter().copied()
    }

    pub fn has_channels(&self) -> bool {
        !self.channels.is_empty()
    }

    pub fn is_recipient(&self, user: UserId) -> bool {
        self.recipients.contains(&user)
    }

    pub fn is_registered(&self, channel: ChannelId) -> bool {
        self.routes.contains(&channel)
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Recipients a post from `channel` goes to, or `None` if the channel has no route.
    pub fn relay_targets(&self, channel: ChannelId) -> Option<Vec<UserId>> {
        if !self.routes.contains(&channel) {
            return None;
        }
        Some(self.recipients.iter().copied().collect())
    }

    fn persist_channels(&self) -> Result<()> {
        let ids = self.channels.iter().map(|c| c.0).collect();
        self.store.save(ListName::Channels, &ids)
    }

    fn persist_users(&self) -> Result<()> {
        let ids = self.recipients.iter().map(|u| u.0).collect();
        self.store.save(ListName::Users, &ids)
    }
}

/// Forward `message` to each recipient in turn. A failed delivery is logged
/// and skipped; it never stops the remaining recipients.
pub async fn fan_out(
    messenger: &dyn MessagingPort,
    channel: ChannelId,
    message: MessageRef,
    recipients: &[UserId],
) -> RelayOutcome {
    let mut outcome = RelayOutcome::default();
    for &user in recipients {
        match messenger.forward_message(user.into(), message).await {
            Ok(_) => outcome.delivered.push(user),
            Err(e) => {
                tracing::warn!(
                    channel = channel.0,
                    user = user.0,
                    "relay failed: {e}"
                );
                outcome.failed.push(user);
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, MessageId};
    use crate::store::MemoryListStore;
    use crate::test_support::FakeMessenger;

    fn registry_with(store: Arc<MemoryListStore>) -> SubscriptionRegistry {
        SubscriptionRegistry::load(store)
    }

    #[test]
    fn register_is_idempotent() {
        let mut r = registry_with(Arc::new(MemoryListStore::new()));
        assert!(r.register_channel(ChannelId(-100777)));
        assert!(!r.register_channel(ChannelId(-100777)));
        assert_eq!(r.route_count(), 1);
    }

    #[test]
    fn startup_registers_every_listed_channel() {
        let store = Arc::new(
            MemoryListStore::new().with_list(ListName::Channels, [-100777, -100555]),
        );
        let mut r = registry_with(store);
        assert_eq!(r.route_count(), 0);
        assert_eq!(r.register_all(), 2);
        assert!(r.is_registered(ChannelId(-100555)));
        assert_eq!(r.register_all(), 0);
    }

    #[test]
    fn add_then_remove_restores_the_list() {
        let store = Arc::new(MemoryListStore::new().with_list(ListName::Channels, [-100555]));
        let mut r = registry_with(store.clone());
        r.register_all();
        let before = store.load(ListName::Channels);

        r.add_channel(ChannelId(-100777)).unwrap();
        assert!(r.is_registered(ChannelId(-100777)));
        assert!(store.load(ListName::Channels).contains(&-100777));

        r.remove_channel(ChannelId(-100777)).unwrap();
        assert!(!r.is_registered(ChannelId(-100777)));
        assert_eq!(store.load(ListName::Channels), before);
    }

    #[test]
    fn duplicate_and_missing_channels_are_rejected() {
        let mut r = registry_with(Arc::new(MemoryListStore::new()));
        r.add_channel(ChannelId(-100777)).unwrap();
        assert!(matches!(
            r.add_channel(ChannelId(-100777)),
            Err(Error::Duplicate(_))
        ));
        assert_eq!(r.route_count(), 1);
        assert!(matches!(
            r.remove_channel(ChannelId(-100888)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn user_mutations_persist() {
        let store = Arc::new(MemoryListStore::new());
        let mut r = registry_with(store.clone());
        r.add_user(UserId(12345)).unwrap();
        assert!(store.load(ListName::Users).contains(&12345));
        assert!(matches!(r.add_user(UserId(12345)), Err(Error::Duplicate(_))));

        assert!(matches!(
            r.remove_user(UserId(99999)),
            Err(Error::NotFound(_))
        ));
        r.remove_user(UserId(12345)).unwrap();
        assert!(store.load(ListName::Users).is_empty());
    }

    #[test]
    fn unregistered_channels_have_no_targets() {
        let store = Arc::new(MemoryListStore::new().with_list(ListName::Users, [1, 2]));
        let mut r = registry_with(store);
        assert_eq!(r.relay_targets(ChannelId(-100777)), None);
        r.add_channel(ChannelId(-100777)).unwrap();
        assert_eq!(
            r.relay_targets(ChannelId(-100777)),
            Some(vec![UserId(1), UserId(2)])
        );
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_block_the_rest() {
        let m = FakeMessenger::default().with_failing_recipient(2);
        let post = MessageRef {
            chat_id: ChatId(-100777),
            message_id: MessageId(10),
        };
        let recipients = [UserId(1), UserId(2), UserId(3)];

        let out = fan_out(&m, ChannelId(-100777), post, &recipients).await;

        assert_eq!(out.delivered, vec![UserId(1), UserId(3)]);
        assert_eq!(out.failed, vec![UserId(2)]);
        let forwarded: Vec<i64> = m.forwards().iter().map(|(to, _)| to.0).collect();
        assert_eq!(forwarded, vec![1, 3]);
    }
}
