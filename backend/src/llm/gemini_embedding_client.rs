// Gemini Embedding Client using the REST API.

use crate::config::Config;
use crate::errors::AppError;
use crate::llm::EmbeddingClient;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, instrument};

// --- Request Structs ---

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    #[serde(rename = "taskType")] // Match API naming
    task_type: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

// --- Response Structs ---

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Embedding,
}

#[derive(Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

// --- Error Response Struct ---
#[derive(Deserialize, Debug)]
struct GeminiApiErrorResponse {
    error: GeminiApiError,
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)] // code/status are logged via Debug
struct GeminiApiError {
    code: i32,
    message: String,
    status: String,
}

#[derive(Clone)]
pub struct RestGeminiEmbeddingClient {
    reqwest_client: ReqwestClient,
    config: Arc<Config>,
    model_name: String,
}

#[async_trait]
impl EmbeddingClient for RestGeminiEmbeddingClient {
    #[instrument(skip(self, text), fields(task_type, model_name = %self.model_name), err)]
    async fn embed_content(&self, text: &str, task_type: &str) -> Result<Vec<f32>, AppError> {
        let api_key = self.config.gemini_api_key.as_ref().ok_or_else(|| {
            error!("GEMINI_API_KEY not configured");
            AppError::ConfigError("GEMINI_API_KEY not configured".to_string())
        })?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/{}:embedContent?key={}",
            self.model_name, api_key
        );

        let request_body = EmbeddingRequest {
            model: &self.model_name,
            content: Content {
                parts: vec![Part { text }],
            },
            task_type,
        };

        let response = self
            .reqwest_client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to Gemini Embedding API failed");
                AppError::HttpRequestError(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.json::<GeminiApiErrorResponse>().await;
            error!(status = %status, error_details = ?error_body, "Gemini Embedding API returned error status");
            let error_message = error_body
                .map(|b| b.error.message)
                .unwrap_or_else(|e| format!("Failed to parse error body: {e}"));
            return Err(match status.as_u16() {
                429 => AppError::RateLimited,
                400 => AppError::InvalidInput(error_message),
                _ => AppError::EmbeddingError(format!(
                    "Gemini API error ({status}): {error_message}"
                )),
            });
        }

        let embedding_response = response.json::<EmbeddingResponse>().await.map_err(|e| {
            error!(error = %e, "Failed to parse successful Gemini Embedding API response");
            AppError::SerializationError(format!("Failed to parse Gemini embedding response: {e}"))
        })?;

        Ok(embedding_response.embedding.values)
    }
}

pub fn build_gemini_embedding_client(
    config: Arc<Config>,
) -> Result<RestGeminiEmbeddingClient, AppError> {
    let reqwest_client = ReqwestClient::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| AppError::InternalServerError(format!("Failed to build Reqwest client: {e}")))?;

    let model_name = config.embedding_model.clone();

    Ok(RestGeminiEmbeddingClient {
        reqwest_client,
        config,
        model_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn create_test_config(api_key: Option<String>) -> Arc<Config> {
        Arc::new(Config {
            gemini_api_key: api_key,
            ..Default::default()
        })
    }

    #[test]
    fn test_build_gemini_embedding_client_success() {
        let config = create_test_config(Some("dummy-key".to_string()));
        let result = build_gemini_embedding_client(config.clone());
        assert!(result.is_ok());
        let client = result.unwrap();
        assert_eq!(client.model_name, config.embedding_model);
    }

    #[tokio::test]
    async fn test_embed_content_missing_api_key() {
        let config = create_test_config(None);
        let client =
            build_gemini_embedding_client(config).expect("builder should succeed without key");

        let result = client.embed_content("Test input text", "RETRIEVAL_QUERY").await;

        assert!(result.is_err());
        match result.err().unwrap() {
            AppError::ConfigError(msg) => {
                assert_eq!(msg, "GEMINI_API_KEY not configured");
            }
            other => panic!("Expected ConfigError, got {other:?}"),
        }
    }
}
