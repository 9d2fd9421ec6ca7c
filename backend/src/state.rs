use std::sync::Arc;

use crate::config::Config;
use crate::llm::{AiClient, EmbeddingClient};
use crate::services::embeddings::EmbeddingPipelineServiceTrait;
use crate::vector_db::VectorStore;

// --- DB Connection Pool Type ---
pub type DbPool = deadpool_diesel::postgres::Pool;

// --- Shared application state ---
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub ai_client: Arc<dyn AiClient + Send + Sync>,
    pub embedding_client: Arc<dyn EmbeddingClient + Send + Sync>,
    pub vector_store: Arc<dyn VectorStore + Send + Sync>,
    pub embedding_pipeline: Arc<dyn EmbeddingPipelineServiceTrait + Send + Sync>,
}
