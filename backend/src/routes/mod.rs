pub mod auth;
pub mod characters;
pub mod chat;
pub mod health;

use axum::Router;
use axum::routing::get;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::state::AppState;

/// Composes the full application router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/auth", auth::auth_routes())
        .nest("/characters", characters::character_routes())
        .nest("/chat", chat::chat_routes())
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()),
        )
}
