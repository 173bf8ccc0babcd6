//! Core domain types: identities, roles, methods and the guarded resources.

use crate::domain::error::GateError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Borrow the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// User identifier.
    UserId
);
uuid_id!(
    /// Conversation identifier.
    ConversationId
);
uuid_id!(
    /// Message identifier.
    MessageId
);

/// Caller role as issued by the authentication collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(Role::Regular),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(GateError::UnknownRole(other.to_string())),
        }
    }
}

/// Authenticated caller, immutable for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub id: UserId,
    pub role: Role,
    pub authenticated: bool,
    /// Display label used by the audit trail (the original service logs emails).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ClientIdentity {
    /// An authenticated caller with the given role.
    pub fn authenticated(id: UserId, role: Role) -> Self {
        Self {
            id,
            role,
            authenticated: true,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Label written to the audit trail.
    pub fn audit_label(&self) -> String {
        match &self.email {
            Some(email) => email.clone(),
            None => self.id.to_string(),
        }
    }
}

/// HTTP-style request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

/// Method class used by the object-level authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodClass {
    /// GET, HEAD, OPTIONS
    Read,
    /// POST
    Create,
    /// PUT, PATCH, DELETE
    Mutate,
}

impl RequestMethod {
    pub fn class(&self) -> MethodClass {
        match self {
            RequestMethod::Get | RequestMethod::Head | RequestMethod::Options => MethodClass::Read,
            RequestMethod::Post => MethodClass::Create,
            RequestMethod::Put | RequestMethod::Patch | RequestMethod::Delete => {
                MethodClass::Mutate
            }
        }
    }

    /// Write-type requests are the ones subject to rate limiting.
    pub fn is_write(&self) -> bool {
        matches!(self, RequestMethod::Post)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Head => "HEAD",
            RequestMethod::Options => "OPTIONS",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMethod {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(RequestMethod::Get),
            "HEAD" => Ok(RequestMethod::Head),
            "OPTIONS" => Ok(RequestMethod::Options),
            "POST" => Ok(RequestMethod::Post),
            "PUT" => Ok(RequestMethod::Put),
            "PATCH" => Ok(RequestMethod::Patch),
            "DELETE" => Ok(RequestMethod::Delete),
            other => Err(GateError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Reference to the resource a request targets, before it is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ResourceRef {
    Conversation(ConversationId),
    Message(MessageId),
}

/// A conversation and its participant set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    participants: HashSet<UserId>,
}

impl Conversation {
    /// Build a conversation. At least one participant is required.
    pub fn new(
        id: ConversationId,
        participants: impl IntoIterator<Item = UserId>,
    ) -> Result<Self, GateError> {
        let participants: HashSet<UserId> = participants.into_iter().collect();
        if participants.is_empty() {
            return Err(GateError::EmptyConversation(id));
        }
        Ok(Self { id, participants })
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn participants(&self) -> &HashSet<UserId> {
        &self.participants
    }

    pub fn is_participant(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }
}

/// A message inside a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    conversation_id: ConversationId,
    sender: UserId,
}

impl Message {
    /// Build a message sent by `sender`, who must participate in `conversation`.
    pub fn new(
        id: MessageId,
        conversation: &Conversation,
        sender: UserId,
    ) -> Result<Self, GateError> {
        if !conversation.is_participant(&sender) {
            return Err(GateError::SenderNotParticipant {
                sender,
                conversation: conversation.id(),
            });
        }
        Ok(Self {
            id,
            conversation_id: conversation.id(),
            sender,
        })
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn sender(&self) -> UserId {
        self.sender
    }
}
