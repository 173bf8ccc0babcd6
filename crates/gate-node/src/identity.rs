//! Development identity extraction.
//!
//! Credential validation lives outside this node. Here the caller's identity
//! is taken from plain headers set by the upstream authenticator:
//!
//! - `x-user-id`: UUID (required)
//! - `x-user-role`: `regular`, `moderator` or `admin` (default `regular`)
//! - `x-user-email`: optional audit label
//!
//! A missing or malformed id leaves the request anonymous.

use axum::{body::Body, extract::Request, http::HeaderMap, middleware::Next, response::Response};
use chat_gate::{ClientIdentity, Role, UserId};
use tracing::debug;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Parse an identity from request headers.
pub fn identity_from_headers(headers: &HeaderMap) -> Option<ClientIdentity> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let id: UserId = header(USER_ID_HEADER)?.trim().parse().ok()?;
    let role = match header(USER_ROLE_HEADER) {
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => role,
            Err(e) => {
                debug!(error = %e, "Unrecognised role header, treating request as anonymous");
                return None;
            }
        },
        None => Role::Regular,
    };

    let identity = ClientIdentity::authenticated(id, role);
    Some(match header(USER_EMAIL_HEADER) {
        Some(email) => identity.with_email(email),
        None => identity,
    })
}

/// Middleware inserting the parsed [`ClientIdentity`] into the extensions.
pub async fn attach_identity(mut req: Request<Body>, next: Next) -> Response {
    if let Some(identity) = identity_from_headers(req.headers()) {
        req.extensions_mut().insert(identity);
    }
    next.run(req).await
}
