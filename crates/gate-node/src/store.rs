//! In-memory conversation and message store.

use chat_gate::{Conversation, ConversationId, GateError, Message, MessageId, UserId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

/// A stored message with its text.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub message: Message,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// Message as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender: UserId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl From<&StoredMessage> for MessageView {
    fn from(stored: &StoredMessage) -> Self {
        Self {
            id: stored.message.id(),
            conversation_id: stored.message.conversation_id(),
            sender: stored.message.sender(),
            body: stored.body.clone(),
            sent_at: stored.sent_at,
            edited_at: stored.edited_at,
        }
    }
}

/// Conversation as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub id: ConversationId,
    pub participants: Vec<UserId>,
}

impl From<&Conversation> for ConversationView {
    fn from(conversation: &Conversation) -> Self {
        let mut participants: Vec<UserId> = conversation.participants().iter().copied().collect();
        participants.sort();
        Self {
            id: conversation.id(),
            participants,
        }
    }
}

/// Conversations and messages behind read/write locks.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
    messages: RwLock<HashMap<MessageId, StoredMessage>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_conversation(
        &self,
        participants: impl IntoIterator<Item = UserId>,
    ) -> Result<Conversation, GateError> {
        let conversation = Conversation::new(ConversationId::new(), participants)?;
        self.conversations
            .write()
            .insert(conversation.id(), conversation.clone());
        Ok(conversation)
    }

    pub fn conversation(&self, id: ConversationId) -> Option<Conversation> {
        self.conversations.read().get(&id).cloned()
    }

    /// Conversations `user` participates in.
    pub fn conversations_of(&self, user: UserId) -> Vec<Conversation> {
        self.conversations
            .read()
            .values()
            .filter(|c| c.is_participant(&user))
            .cloned()
            .collect()
    }

    /// Remove a conversation and all of its messages.
    pub fn delete_conversation(&self, id: ConversationId) -> Option<Conversation> {
        let removed = self.conversations.write().remove(&id)?;
        self.messages
            .write()
            .retain(|_, stored| stored.message.conversation_id() != id);
        Some(removed)
    }

    pub fn add_message(
        &self,
        conversation: &Conversation,
        sender: UserId,
        body: impl Into<String>,
    ) -> Result<StoredMessage, GateError> {
        let message = Message::new(MessageId::new(), conversation, sender)?;
        let stored = StoredMessage {
            message,
            body: body.into(),
            sent_at: Utc::now(),
            edited_at: None,
        };
        self.messages.write().insert(stored.message.id(), stored.clone());
        Ok(stored)
    }

    /// A message together with the conversation that owns it.
    pub fn message_with_conversation(&self, id: MessageId) -> Option<(StoredMessage, Conversation)> {
        let stored = self.messages.read().get(&id).cloned()?;
        let conversation = self.conversation(stored.message.conversation_id())?;
        Some((stored, conversation))
    }

    /// Messages of a conversation, oldest first.
    pub fn messages_in(&self, conversation: ConversationId) -> Vec<StoredMessage> {
        let mut messages: Vec<StoredMessage> = self
            .messages
            .read()
            .values()
            .filter(|stored| stored.message.conversation_id() == conversation)
            .cloned()
            .collect();
        messages.sort_by_key(|stored| stored.sent_at);
        messages
    }

    pub fn edit_message(&self, id: MessageId, body: impl Into<String>) -> Option<StoredMessage> {
        let mut messages = self.messages.write();
        let stored = messages.get_mut(&id)?;
        stored.body = body.into();
        stored.edited_at = Some(Utc::now());
        Some(stored.clone())
    }

    pub fn delete_message(&self, id: MessageId) -> Option<StoredMessage> {
        self.messages.write().remove(&id)
    }
}
