//! Route table.
//!
//! | Group        | Routes                                          | Route guards            |
//! |--------------|-------------------------------------------------|-------------------------|
//! | public       | `GET /health`                                   | none                    |
//! | conversations| `/conversations`, `/conversations/:id[/messages]`, `/messages/:id` | authentication |
//! | moderation   | `GET /moderation/metrics`                       | authentication, role    |
//!
//! The access window and the write rate limiter apply to every group.

use crate::handlers::{self, AppState};
use crate::identity::attach_identity;
use axum::{middleware, routing::get, Router};
use chat_gate::{GateLayer, RouteSpec, SecurityConfig, TracingLayer};

/// Build the application router.
pub fn build_router(state: AppState, security: &SecurityConfig) -> Router {
    let gate = |route: RouteSpec| GateLayer::new(state.pipeline.clone(), route, security.clone());

    let public = Router::new()
        .route("/health", get(handlers::health))
        .layer(gate(RouteSpec::public("health")));

    let conversations = Router::new()
        .route(
            "/conversations",
            get(handlers::list_conversations).post(handlers::create_conversation),
        )
        .route(
            "/conversations/:id",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
        .route(
            "/conversations/:id/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .route(
            "/messages/:id",
            get(handlers::get_message)
                .put(handlers::edit_message)
                .patch(handlers::edit_message)
                .delete(handlers::delete_message),
        )
        .layer(gate(RouteSpec::authenticated("conversations")));

    let moderation = Router::new().route("/moderation/metrics", get(handlers::gate_metrics));
    #[cfg(feature = "metrics")]
    let moderation = moderation.route(
        "/moderation/metrics/prometheus",
        get(handlers::gate_metrics_prometheus),
    );
    let moderation = moderation.layer(gate(RouteSpec::privileged("moderation")));

    Router::new()
        .merge(public)
        .merge(conversations)
        .merge(moderation)
        .layer(middleware::from_fn(attach_identity))
        .layer(TracingLayer::new())
        .with_state(state)
}
