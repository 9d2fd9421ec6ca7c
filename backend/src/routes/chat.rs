// backend/src/routes/chat.rs

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::jwt::AuthenticatedUser;
use crate::errors::AppError;
use crate::models::conversations::{
    ChatExchangeResponse, Conversation, Message, SendMessagePayload,
};
use crate::services::chat::{
    generate_chat_response, get_messages_for_conversation, get_or_create_conversation,
    list_conversations_for_user,
};
use crate::state::AppState;

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/start/{character_id}", post(start_conversation_handler))
        .route("/conversations", get(list_conversations_handler))
        .route("/history/{conversation_id}", get(history_handler))
        .route("/message/{conversation_id}", post(send_message_handler))
}

// POST /chat/start/{character_id}
#[instrument(skip(state, user), fields(user_id = %user.id), err)]
pub async fn start_conversation_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(character_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conversation = get_or_create_conversation(&state.pool, user.id, character_id).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

// GET /chat/conversations
#[instrument(skip(state, user), fields(user_id = %user.id), err)]
pub async fn list_conversations_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Conversation>>, AppError> {
    let conversations = list_conversations_for_user(&state.pool, user.id).await?;
    Ok(Json(conversations))
}

// GET /chat/history/{conversation_id}
#[instrument(skip(state, user), fields(user_id = %user.id), err)]
pub async fn history_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = get_messages_for_conversation(&state.pool, user.id, conversation_id).await?;
    Ok(Json(messages))
}

// POST /chat/message/{conversation_id}
#[instrument(skip(state, user, payload), fields(user_id = %user.id), err)]
pub async fn send_message_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<Json<ChatExchangeResponse>, AppError> {
    let exchange =
        generate_chat_response(&state, user.id, conversation_id, payload.message).await?;
    Ok(Json(exchange))
}
