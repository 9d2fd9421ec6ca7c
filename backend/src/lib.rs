pub mod auth;
pub mod config;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod prompt_builder;
pub mod routes;
pub mod schema;
pub mod services;
pub mod state;
pub mod vector_db;

use deadpool_diesel::postgres::Pool as DeadpoolPool;

// Define PgPool type alias here for library-wide use
pub type PgPool = DeadpoolPool;

// Re-export AppState for convenience
pub use state::AppState;
