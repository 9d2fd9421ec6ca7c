use async_trait::async_trait;
use genai::{
    Client, ClientBuilder,
    chat::{ChatOptions, ChatRequest, ChatResponse},
};
use std::sync::Arc;

use super::AiClient;
use crate::errors::AppError;

/// Wrapper struct around the genai::Client to implement our AiClient trait.
pub struct GeminiChatClient {
    inner: Client,
}

#[async_trait]
impl AiClient for GeminiChatClient {
    async fn exec_chat(
        &self,
        model_name: &str,
        request: ChatRequest,
        options: Option<ChatOptions>,
    ) -> Result<ChatResponse, AppError> {
        self.inner
            .exec_chat(model_name, request, options.as_ref())
            .await
            .map_err(map_provider_error)
    }
}

#[async_trait]
impl AiClient for Arc<GeminiChatClient> {
    async fn exec_chat(
        &self,
        model_name: &str,
        request: ChatRequest,
        options: Option<ChatOptions>,
    ) -> Result<ChatResponse, AppError> {
        (**self).exec_chat(model_name, request, options).await
    }
}

/// Builds the GeminiChatClient wrapper. The underlying client reads its API
/// key from the environment.
pub fn build_gemini_client() -> Result<Arc<GeminiChatClient>, AppError> {
    let client = ClientBuilder::default().build();
    Ok(Arc::new(GeminiChatClient { inner: client }))
}

/// Maps a provider error into the failure classes the retry policy
/// distinguishes. The genai error type collapses HTTP details into its
/// message, so classification matches on the status markers it carries.
fn map_provider_error(err: genai::Error) -> AppError {
    let message = err.to_string();
    if message.contains("429") || message.contains("RESOURCE_EXHAUSTED") {
        AppError::RateLimited
    } else if message.contains("400") || message.contains("INVALID_ARGUMENT") {
        AppError::BadRequest(message)
    } else {
        AppError::LlmClientError(message)
    }
}

/// Extracts the text content of a chat response.
pub fn response_text(response: &ChatResponse) -> Result<String, AppError> {
    response
        .content_text_as_str()
        .map(ToString::to_string)
        .ok_or_else(|| AppError::GenerationError("No text content in LLM response".to_string()))
}
