use async_trait::async_trait;
use genai::chat::{ChatOptions, ChatRequest, ChatResponse};

use crate::errors::AppError;

pub mod gemini_client;
pub mod gemini_embedding_client;
pub mod retry;

pub use gemini_client::{GeminiChatClient, build_gemini_client, response_text};
pub use gemini_embedding_client::{RestGeminiEmbeddingClient, build_gemini_embedding_client};
pub use retry::{RetryPolicy, RetryingAiClient};

/// Trait defining the interface for AI chat completion operations.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Executes a chat request with the AI model.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The identifier for the specific AI model to use.
    /// * `request` - The chat request containing messages and system prompt.
    /// * `options` - Optional generation configuration.
    async fn exec_chat(
        &self,
        model_name: &str,
        request: ChatRequest,
        options: Option<ChatOptions>,
    ) -> Result<ChatResponse, AppError>;
}

/// Trait defining the interface for text embedding operations.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embeds a piece of text for the given task type
    /// (e.g. `RETRIEVAL_DOCUMENT` for storage, `RETRIEVAL_QUERY` for search).
    async fn embed_content(&self, text: &str, task_type: &str) -> Result<Vec<f32>, AppError>;
}
