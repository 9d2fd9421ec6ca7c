// backend/src/routes/characters.rs

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::auth::jwt::AuthenticatedUser;
use crate::errors::AppError;
use crate::models::characters::{CharacterPayload, CharacterResponse, UpdateCharacterPayload};
use crate::services::character_generation::generate_character;
use crate::services::character_service::{
    create_character, delete_character, get_character, list_characters, update_character,
};
use crate::state::AppState;

pub fn character_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_characters_handler).post(create_character_handler))
        .route(
            "/{id}",
            get(get_character_handler)
                .put(update_character_handler)
                .delete(delete_character_handler),
        )
        .route("/generate", axum::routing::post(generate_character_handler))
}

// GET /characters
#[instrument(skip(state, user), fields(user_id = %user.id), err)]
pub async fn list_characters_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<CharacterResponse>>, AppError> {
    let characters = list_characters(&state.pool, user.id).await?;
    Ok(Json(
        characters.into_iter().map(CharacterResponse::from).collect(),
    ))
}

// GET /characters/{id}
#[instrument(skip(state, user), fields(user_id = %user.id), err)]
pub async fn get_character_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(character_id): Path<Uuid>,
) -> Result<Json<CharacterResponse>, AppError> {
    let character = get_character(&state.pool, user.id, character_id).await?;
    Ok(Json(CharacterResponse::from(character)))
}

// POST /characters
#[instrument(skip(state, user, payload), fields(user_id = %user.id), err)]
pub async fn create_character_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CharacterPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let new_character = payload.into_new_character(user.id)?;
    let character = create_character(&state.pool, new_character).await?;
    Ok((StatusCode::CREATED, Json(CharacterResponse::from(character))))
}

// PUT /characters/{id}
#[instrument(skip(state, user, payload), fields(user_id = %user.id), err)]
pub async fn update_character_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(character_id): Path<Uuid>,
    Json(payload): Json<UpdateCharacterPayload>,
) -> Result<Json<CharacterResponse>, AppError> {
    let character = update_character(&state.pool, user.id, character_id, payload).await?;
    Ok(Json(CharacterResponse::from(character)))
}

// DELETE /characters/{id}
#[instrument(skip(state, user), fields(user_id = %user.id), err)]
pub async fn delete_character_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(character_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_character(&state.pool, user.id, character_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Debug)]
pub struct GenerateCharacterPayload {
    pub preferences: Map<String, Value>,
}

// POST /characters/generate
#[instrument(skip(state, user, payload), fields(user_id = %user.id), err)]
pub async fn generate_character_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<GenerateCharacterPayload>,
) -> Result<impl IntoResponse, AppError> {
    if payload.preferences.is_empty() {
        return Err(AppError::BadRequest(
            "At least one preference is required".into(),
        ));
    }
    let character = generate_character(&state, user.id, &payload.preferences).await?;
    Ok((StatusCode::CREATED, Json(CharacterResponse::from(character))))
}
