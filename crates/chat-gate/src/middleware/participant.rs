//! Object-level authorization over conversations and messages.
//!
//! | Resource     | Read (GET/HEAD/OPTIONS) | Create (POST) | Mutate (PUT/PATCH/DELETE) |
//! |--------------|-------------------------|---------------|---------------------------|
//! | Conversation | participant             | participant   | participant               |
//! | Message      | participant             | participant   | participant and sender    |
//!
//! Run by handlers after the pre-dispatch pipeline allowed the request and
//! the target entity has been loaded, before any write.

use crate::domain::{
    ClientIdentity, Conversation, Denial, Message, MethodClass, RequestContext, RequestMethod,
    Verdict,
};
use tracing::{debug, warn};

/// A loaded resource.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Conversation(&'a Conversation),
    /// A message together with the conversation that owns it
    Message {
        message: &'a Message,
        conversation: &'a Conversation,
    },
}

/// Participant and ownership rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParticipantAuthorizer;

impl ParticipantAuthorizer {
    pub fn new() -> Self {
        Self
    }

    /// Decide for an authenticated identity.
    pub fn evaluate(
        &self,
        identity: &ClientIdentity,
        resource: Resource<'_>,
        method: RequestMethod,
    ) -> Verdict {
        match resource {
            Resource::Conversation(conversation) => {
                if conversation.is_participant(&identity.id) {
                    Verdict::Allow
                } else {
                    Verdict::Deny(Denial::not_participant())
                }
            }
            Resource::Message {
                message,
                conversation,
            } => {
                if message.conversation_id() != conversation.id() {
                    warn!(
                        message = %message.id(),
                        conversation = %conversation.id(),
                        "Message checked against a conversation that does not own it"
                    );
                    return Verdict::Deny(Denial::not_participant());
                }
                if !conversation.is_participant(&identity.id) {
                    return Verdict::Deny(Denial::not_participant());
                }
                match method.class() {
                    MethodClass::Read | MethodClass::Create => Verdict::Allow,
                    MethodClass::Mutate if message.sender() == identity.id => Verdict::Allow,
                    MethodClass::Mutate => Verdict::Deny(Denial::not_owner()),
                }
            }
        }
    }

    /// Like [`evaluate`](Self::evaluate), but requires an authenticated
    /// identity first.
    pub fn authorize(
        &self,
        identity: Option<&ClientIdentity>,
        resource: Resource<'_>,
        method: RequestMethod,
    ) -> Verdict {
        let Some(identity) = identity.filter(|identity| identity.authenticated) else {
            return Verdict::Deny(Denial::unauthenticated());
        };

        let verdict = self.evaluate(identity, resource, method);
        match &verdict {
            Verdict::Allow => debug!(user = %identity.id, method = %method, "Resource access allowed"),
            Verdict::Deny(denial) => warn!(
                user = %identity.id,
                method = %method,
                reason = %denial.reason,
                "Resource access denied"
            ),
        }
        verdict
    }

    /// Authorize using the identity and method of a request context.
    pub fn authorize_context(&self, ctx: &RequestContext, resource: Resource<'_>) -> Verdict {
        self.authorize(ctx.identity(), resource, ctx.method())
    }
}
