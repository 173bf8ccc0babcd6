//! Conversation and message handlers.
//!
//! Every handler runs behind a [`GateLayer`](chat_gate::GateLayer) and reads
//! the [`RequestContext`] it inserted. Object-level checks run after the
//! entity is loaded and before anything is written.

use crate::store::{ConversationStore, ConversationView, MessageView};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chat_gate::{
    AuthorizationPipeline, ClientIdentity, ConversationId, Denial, GateError, MessageId,
    RequestContext, Resource, UserId,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AuthorizationPipeline>,
    pub store: Arc<ConversationStore>,
}

impl AppState {
    pub fn new(pipeline: Arc<AuthorizationPipeline>) -> Self {
        Self {
            pipeline,
            store: Arc::new(ConversationStore::new()),
        }
    }
}

/// Handler errors.
#[derive(Debug)]
pub enum AppError {
    Denied(Denial),
    NotFound,
    BadRequest(String),
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        AppError::Denied(denial)
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Denied(denial) => denial.into_response(),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "not_found", "message": "Not found."})),
            )
                .into_response(),
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "bad_request", "message": message})),
            )
                .into_response(),
        }
    }
}

type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Deserialize)]
pub struct CreateConversation {
    /// Other participants; the caller is always added
    #[serde(default)]
    pub participants: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub body: String,
}

fn caller(ctx: &RequestContext) -> AppResult<&ClientIdentity> {
    ctx.authenticated_identity()
        .ok_or_else(|| AppError::Denied(Denial::unauthenticated()))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "version": chat_gate::VERSION}))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<Vec<ConversationView>>> {
    let user = caller(&ctx)?;
    let mut views: Vec<ConversationView> = state
        .store
        .conversations_of(user.id)
        .iter()
        .map(ConversationView::from)
        .collect();
    views.sort_by_key(|view| view.id);
    Ok(Json(views))
}

pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateConversation>,
) -> AppResult<(StatusCode, Json<ConversationView>)> {
    let user = caller(&ctx)?;
    let participants = request
        .participants
        .into_iter()
        .chain(std::iter::once(user.id));
    let conversation = state.store.create_conversation(participants)?;
    info!(conversation = %conversation.id(), creator = %user.id, "Conversation created");
    Ok((StatusCode::CREATED, Json(ConversationView::from(&conversation))))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<ConversationId>,
) -> AppResult<Json<ConversationView>> {
    let conversation = state.store.conversation(id).ok_or(AppError::NotFound)?;
    state
        .pipeline
        .authorize_resource(&ctx, Resource::Conversation(&conversation))
        .into_result()?;
    Ok(Json(ConversationView::from(&conversation)))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<ConversationId>,
) -> AppResult<StatusCode> {
    let conversation = state.store.conversation(id).ok_or(AppError::NotFound)?;
    state
        .pipeline
        .authorize_resource(&ctx, Resource::Conversation(&conversation))
        .into_result()?;
    state.store.delete_conversation(id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<ConversationId>,
) -> AppResult<Json<Vec<MessageView>>> {
    let conversation = state.store.conversation(id).ok_or(AppError::NotFound)?;
    state
        .pipeline
        .authorize_resource(&ctx, Resource::Conversation(&conversation))
        .into_result()?;
    let messages = state.store.messages_in(id);
    Ok(Json(messages.iter().map(MessageView::from).collect()))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<ConversationId>,
    Json(request): Json<MessageBody>,
) -> AppResult<(StatusCode, Json<MessageView>)> {
    let conversation = state.store.conversation(id).ok_or(AppError::NotFound)?;
    state
        .pipeline
        .authorize_resource(&ctx, Resource::Conversation(&conversation))
        .into_result()?;
    let user = caller(&ctx)?;
    let stored = state.store.add_message(&conversation, user.id, request.body)?;
    Ok((StatusCode::CREATED, Json(MessageView::from(&stored))))
}

pub async fn get_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<MessageId>,
) -> AppResult<Json<MessageView>> {
    let (stored, conversation) = state
        .store
        .message_with_conversation(id)
        .ok_or(AppError::NotFound)?;
    state
        .pipeline
        .authorize_resource(
            &ctx,
            Resource::Message {
                message: &stored.message,
                conversation: &conversation,
            },
        )
        .into_result()?;
    Ok(Json(MessageView::from(&stored)))
}

pub async fn edit_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<MessageId>,
    Json(request): Json<MessageBody>,
) -> AppResult<Json<MessageView>> {
    let (stored, conversation) = state
        .store
        .message_with_conversation(id)
        .ok_or(AppError::NotFound)?;
    state
        .pipeline
        .authorize_resource(
            &ctx,
            Resource::Message {
                message: &stored.message,
                conversation: &conversation,
            },
        )
        .into_result()?;
    let edited = state
        .store
        .edit_message(id, request.body)
        .ok_or(AppError::NotFound)?;
    Ok(Json(MessageView::from(&edited)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<MessageId>,
) -> AppResult<StatusCode> {
    let (stored, conversation) = state
        .store
        .message_with_conversation(id)
        .ok_or(AppError::NotFound)?;
    state
        .pipeline
        .authorize_resource(
            &ctx,
            Resource::Message {
                message: &stored.message,
                conversation: &conversation,
            },
        )
        .into_result()?;
    state.store.delete_message(id);
    Ok(StatusCode::NO_CONTENT)
}

/// Pipeline counters, for moderators and admins.
pub async fn gate_metrics(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.pipeline.metrics().to_json())
}

/// Prometheus text export.
#[cfg(feature = "metrics")]
pub async fn gate_metrics_prometheus(State(state): State<AppState>) -> Response {
    match state.pipeline.metrics().to_prometheus() {
        Ok(text) => text.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
