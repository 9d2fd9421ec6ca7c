use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::auth::jwt::{AuthenticatedUser, issue_token};
use crate::auth::{create_user, verify_credentials};
use crate::errors::AppError;
use crate::models::auth::{AuthResponse, LoginPayload, RegisterPayload};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
        .route("/me", get(me_handler))
}

#[instrument(skip(state, payload), err)]
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = create_user(&state.pool, payload.email, payload.password).await?;
    info!(user_id = %user.id, "User registered");

    let token = issue_jwt(&state, user.id, &user.email)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::bearer(user.id, user.email, token)),
    ))
}

#[instrument(skip(state, payload), err)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = verify_credentials(&state.pool, payload.email, payload.password).await?;
    info!(user_id = %user.id, "User logged in");

    let token = issue_jwt(&state, user.id, &user.email)?;
    Ok(Json(AuthResponse::bearer(user.id, user.email, token)))
}

#[derive(Serialize, Debug)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: String,
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn me_handler(user: AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.id,
        email: user.email,
    })
}

fn issue_jwt(state: &AppState, user_id: Uuid, email: &str) -> Result<String, AppError> {
    let secret = state
        .config
        .jwt_secret
        .as_ref()
        .ok_or_else(|| AppError::ConfigError("JWT_SECRET is not configured".to_string()))?;
    issue_token(secret, user_id, email, state.config.jwt_expiry_hours)
}
