//! Hand-written port fakes shared by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, ChatInfo, EntityRef, MessageId, MessageRef},
    errors::{Error, ResolveError},
    messaging::port::MessagingPort,
    Result,
};

#[derive(Default)]
pub(crate) struct FakeMessenger {
    next_id: Mutex<i32>,
    entities: Mutex<HashMap<EntityRef, ChatInfo>>,
    invites: Mutex<HashMap<String, std::result::Result<Vec<ChatInfo>, ResolveError>>>,
    join_errors: Mutex<HashMap<EntityRef, ResolveError>>,
    failing_recipients: Mutex<HashSet<i64>>,
    lookup_delay: Option<Duration>,

    sends: Mutex<Vec<(ChatId, String)>>,
    forwards: Mutex<Vec<(ChatId, MessageRef)>>,
    joins: Mutex<Vec<EntityRef>>,
    lookups: Mutex<Vec<EntityRef>>,
}

impl FakeMessenger {
    /// Register a channel reachable by id and, if given, by username.
    pub fn with_channel(self, id: i64, title: Option<&str>, username: Option<&str>) -> Self {
        let info = ChatInfo {
            id,
            title: title.map(str::to_string),
            username: username.map(str::to_string),
        };
        {
            let mut entities = self.entities.lock().unwrap();
            if let Some(name) = username {
                entities.insert(EntityRef::Username(name.to_string()), info.clone());
            }
            entities.insert(EntityRef::Id(id), info);
        }
        self
    }

    pub fn with_invite(
        self,
        token: &str,
        outcome: std::result::Result<Vec<ChatInfo>, ResolveError>,
    ) -> Self {
        self.invites
            .lock()
            .unwrap()
            .insert(token.to_string(), outcome);
        self
    }

    pub fn with_join_error(self, target: EntityRef, err: ResolveError) -> Self {
        self.join_errors.lock().unwrap().insert(target, err);
        self
    }

    pub fn with_failing_recipient(self, chat_id: i64) -> Self {
        self.failing_recipients.lock().unwrap().insert(chat_id);
        self
    }

    /// Make every `get_entity` call take `delay`.
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn last_reply(&self) -> String {
        self.sends
            .lock()
            .unwrap()
            .last()
            .map(|(_, s)| s.clone())
            .unwrap_or_default()
    }

    pub fn forwards(&self) -> Vec<(ChatId, MessageRef)> {
        self.forwards.lock().unwrap().clone()
    }

    pub fn joins(&self) -> Vec<EntityRef> {
        self.joins.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<EntityRef> {
        self.lookups.lock().unwrap().clone()
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(*guard),
        }
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.sends.lock().unwrap().push((chat_id, html.to_string()));
        Ok(self.alloc(chat_id))
    }

    async fn forward_message(&self, to: ChatId, message: MessageRef) -> Result<MessageRef> {
        if self.failing_recipients.lock().unwrap().contains(&to.0) {
            return Err(Error::External(format!("bot was blocked by {}", to.0)));
        }
        self.forwards.lock().unwrap().push((to, message));
        Ok(self.alloc(to))
    }

    async fn join_channel(&self, target: &EntityRef) -> std::result::Result<(), ResolveError> {
        self.joins.lock().unwrap().push(target.clone());
        match self.join_errors.lock().unwrap().get(target) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn import_invite(&self, token: &str) -> std::result::Result<Vec<ChatInfo>, ResolveError> {
        self.invites
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .unwrap_or(Err(ResolveError::InviteInvalid))
    }

    async fn get_entity(&self, target: &EntityRef) -> std::result::Result<ChatInfo, ResolveError> {
        self.lookups.lock().unwrap().push(target.clone());
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        self.entities
            .lock()
            .unwrap()
            .get(target)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(target.to_string()))
    }
}
