use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What a conversation is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationType {
    Group,
    Pickup,
    Application,
    Private,
}

super::text_enum!(ConversationType {
    Group => "group",
    Pickup => "pickup",
    Application => "application",
    Private => "private",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    #[serde(default)]
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub target_type: ConversationType,
    pub target_id: Option<i64>,
    #[serde(rename = "group")]
    pub group_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        target_type: ConversationType,
        target_id: Option<i64>,
        group_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self { id: 0, target_type, target_id, group_id, updated_at: now }
    }
}

/// A message in a conversation. `thread_id` names the thread root; a root
/// points at itself once its thread has been initialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ConversationMessage {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "conversation")]
    pub conversation_id: i64,
    #[serde(rename = "author")]
    pub author_id: i64,
    pub content: String,
    #[serde(rename = "thread")]
    pub thread_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(conversation_id: i64, author_id: i64, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            conversation_id,
            author_id,
            content: content.into(),
            thread_id: None,
            created_at: now,
        }
    }

    pub fn reply_to(thread_id: i64, conversation_id: i64, author_id: i64, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            thread_id: Some(thread_id),
            ..Self::new(conversation_id, author_id, content, now)
        }
    }

    pub fn is_thread_reply(&self) -> bool {
        matches!(self.thread_id, Some(thread) if thread != self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ConversationParticipant {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "conversation")]
    pub conversation_id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    pub seen_up_to: Option<i64>,
    pub email_notifications: bool,
}

impl ConversationParticipant {
    pub fn new(conversation_id: i64, user_id: i64) -> Self {
        Self {
            id: 0,
            conversation_id,
            user_id,
            seen_up_to: None,
            email_notifications: true,
        }
    }

    pub fn has_seen(&self, message_id: i64) -> bool {
        self.seen_up_to.map_or(false, |seen| seen >= message_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ConversationThreadParticipant {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "thread")]
    pub thread_id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    pub seen_up_to: Option<i64>,
    pub muted: bool,
}

impl ConversationThreadParticipant {
    pub fn new(thread_id: i64, user_id: i64) -> Self {
        Self { id: 0, thread_id, user_id, seen_up_to: None, muted: false }
    }

    pub fn has_seen(&self, message_id: i64) -> bool {
        self.seen_up_to.map_or(false, |seen| seen >= message_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ConversationMessageReaction {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "message")]
    pub message_id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    pub name: String,
}

impl ConversationMessageReaction {
    pub fn new(message_id: i64, user_id: i64, name: impl Into<String>) -> Self {
        Self { id: 0, message_id, user_id, name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_reply_detection() {
        let now = Utc::now();
        let mut root = ConversationMessage::new(1, 1, "hello", now);
        root.id = 10;
        assert!(!root.is_thread_reply());

        root.thread_id = Some(10);
        assert!(!root.is_thread_reply());

        let reply = ConversationMessage::reply_to(10, 1, 2, "hi back", now);
        assert!(reply.is_thread_reply());
    }
}
