//! Infrastructure and model errors.
//!
//! These are NOT denials. A denial is an expected outcome carried by
//! [`Verdict::Deny`](crate::domain::decision::Verdict). A `GateError` means a
//! guard could not reach a decision; the pipeline turns it into a
//! `GuardUnavailable` denial so the request fails closed.

use crate::domain::types::{ConversationId, UserId};
use thiserror::Error;

/// Gate-level errors (internal use, never sent to clients verbatim)
#[derive(Debug, Clone, Error)]
pub enum GateError {
    /// Conversation built without participants
    #[error("conversation {0} has no participants")]
    EmptyConversation(ConversationId),

    /// Message sender is not a participant of the conversation
    #[error("sender {sender} is not a participant of conversation {conversation}")]
    SenderNotParticipant {
        sender: UserId,
        conversation: ConversationId,
    },

    /// Role string not recognised
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// Method string not recognised
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Rate limit store could not be reached or answered inconsistently
    #[error("rate limit store error: {0}")]
    Store(String),

    /// Clock returned a value the guard cannot interpret
    #[error("clock error: {0}")]
    Clock(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for gate operations
pub type GateResult<T> = Result<T, GateError>;
