use std::fmt;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). Private chats share the id of their user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChatId(pub i64);

/// Canonical (marked) peer id of a relayed channel, e.g. `-1001234567890`.
///
/// Every resolution path converges on this form, so it is the only key used
/// in the channel list and the relay routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl From<UserId> for ChatId {
    fn from(u: UserId) -> Self {
        ChatId(u.0)
    }
}

impl From<ChannelId> for ChatId {
    fn from(c: ChannelId) -> Self {
        ChatId(c.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something the messenger can join or look up: a numeric peer or a public username.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Id(i64),
    Username(String),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Id(id) => write!(f, "{id}"),
            EntityRef::Username(name) => write!(f, "@{name}"),
        }
    }
}

/// Entity metadata returned by the messenger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: i64,
    pub title: Option<String>,
    pub username: Option<String>,
}

impl ChatInfo {
    /// Title, else username, else the stringified id.
    pub fn display_name(&self) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.username.as_deref().filter(|u| !u.trim().is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_title_then_username_then_id() {
        let mut info = ChatInfo {
            id: -100777,
            title: Some("News".to_string()),
            username: Some("news".to_string()),
        };
        assert_eq!(info.display_name(), "News");

        info.title = None;
        assert_eq!(info.display_name(), "news");

        info.username = Some(String::new());
        assert_eq!(info.display_name(), "-100777");
    }
}
