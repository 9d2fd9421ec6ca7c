use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use genai::chat::{ChatOptions, ChatRequest, ChatResponse};
use tracing::{error, warn};

use super::AiClient;
use crate::errors::AppError;

/// Retry policy for transient provider failures: up to `max_retries` retries
/// with exponential backoff starting at `backoff_base` and doubling each time
/// (2 s, 4 s, 8 s with the defaults, ~14 s worst case before giving up).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the given retry (1-based): base * 2^(retry - 1).
    fn backoff_delay_for_retry(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(31);
        self.backoff_base.saturating_mul(1 << shift)
    }
}

/// How a completion failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Malformed request: surfaced immediately, never retried.
    ClientFault,
    /// Rate limiting, connectivity, or a generic provider error: retried.
    Transient,
    /// Anything else: surfaced as service-unavailable without retry.
    Other,
}

pub fn classify_failure(error: &AppError) -> FailureClass {
    match error {
        AppError::BadRequest(_) | AppError::InvalidInput(_) | AppError::ValidationError(_) => {
            FailureClass::ClientFault
        }
        AppError::RateLimited | AppError::HttpRequestError(_) | AppError::LlmClientError(_) => {
            FailureClass::Transient
        }
        _ => FailureClass::Other,
    }
}

/// AiClient wrapper applying the retry policy around the inner client.
pub struct RetryingAiClient {
    inner: Arc<dyn AiClient + Send + Sync>,
    policy: RetryPolicy,
}

impl RetryingAiClient {
    pub fn new(inner: Arc<dyn AiClient + Send + Sync>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn with_defaults(inner: Arc<dyn AiClient + Send + Sync>) -> Self {
        Self::new(inner, RetryPolicy::default())
    }
}

#[async_trait]
impl AiClient for RetryingAiClient {
    async fn exec_chat(
        &self,
        model_name: &str,
        request: ChatRequest,
        options: Option<ChatOptions>,
    ) -> Result<ChatResponse, AppError> {
        let mut retries_used = 0_u32;
        loop {
            match self
                .inner
                .exec_chat(model_name, request.clone(), options.clone())
                .await
            {
                Ok(response) => return Ok(response),
                Err(err) => match classify_failure(&err) {
                    FailureClass::ClientFault => {
                        warn!(error = %err, "AI request rejected by provider; not retrying");
                        return Err(err);
                    }
                    FailureClass::Other => {
                        error!(error = %err, "Unexpected AI failure; not retrying");
                        return Err(AppError::ServiceUnavailable(err.to_string()));
                    }
                    FailureClass::Transient => {
                        if retries_used >= self.policy.max_retries {
                            error!(
                                retries = retries_used,
                                error = %err,
                                "AI provider still failing after retries"
                            );
                            return Err(AppError::ServiceUnavailable(err.to_string()));
                        }
                        retries_used += 1;
                        let delay = self.policy.backoff_delay_for_retry(retries_used);
                        warn!(
                            retry = retries_used,
                            max_retries = self.policy.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Retrying AI completion after transient failure"
                        );
                        tokio::time::sleep(delay).await;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genai::ModelIden;
    use genai::adapter::AdapterKind;
    use genai::chat::{MessageContent, Usage};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn text_response(text: &str) -> ChatResponse {
        ChatResponse {
            content: Some(MessageContent::from_text(text)),
            reasoning_content: None,
            model_iden: ModelIden::new(AdapterKind::Gemini, "mock-model"),
            provider_model_iden: ModelIden::new(AdapterKind::Gemini, "mock-model"),
            usage: Usage::default(),
        }
    }

    /// Mock client yielding a scripted sequence of results.
    struct SequencedAiClient {
        responses: Mutex<VecDeque<Result<ChatResponse, AppError>>>,
        calls: AtomicU32,
    }

    impl SequencedAiClient {
        fn new(responses: Vec<Result<ChatResponse, AppError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AiClient for SequencedAiClient {
        async fn exec_chat(
            &self,
            _model_name: &str,
            _request: ChatRequest,
            _options: Option<ChatOptions>,
        ) -> Result<ChatResponse, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(text_response("default")))
        }
    }

    fn transient_error() -> AppError {
        AppError::RateLimited
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transient_failures_then_success() {
        let inner = Arc::new(SequencedAiClient::new(vec![
            Err(transient_error()),
            Err(transient_error()),
            Ok(text_response("Recovered")),
        ]));
        let client = RetryingAiClient::with_defaults(inner.clone());

        let start = tokio::time::Instant::now();
        let response = client
            .exec_chat("test-model", ChatRequest::default(), None)
            .await
            .expect("third attempt should succeed");

        // Exactly two backoff delays: 2 s then 4 s.
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7),
            "expected ~6 s of backoff, got {elapsed:?}"
        );
        assert_eq!(response.content_text_as_str(), Some("Recovered"));
        assert_eq!(inner.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_service_unavailable() {
        let inner = Arc::new(SequencedAiClient::new(vec![
            Err(transient_error()),
            Err(transient_error()),
            Err(transient_error()),
            Err(transient_error()),
        ]));
        let client = RetryingAiClient::with_defaults(inner.clone());

        let start = tokio::time::Instant::now();
        let err = client
            .exec_chat("test-model", ChatRequest::default(), None)
            .await
            .expect_err("exhausted retries must fail");

        // Three backoff delays: 2 + 4 + 8 = 14 s, then give up.
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_secs(14) && elapsed < Duration::from_secs(15),
            "expected ~14 s of backoff, got {elapsed:?}"
        );
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
        assert_eq!(inner.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_fault_is_never_retried() {
        let inner = Arc::new(SequencedAiClient::new(vec![
            Err(AppError::BadRequest("bad parameters".to_string())),
            Ok(text_response("should not be reached")),
        ]));
        let client = RetryingAiClient::with_defaults(inner.clone());

        let start = tokio::time::Instant::now();
        let err = client
            .exec_chat("test-model", ChatRequest::default(), None)
            .await
            .expect_err("client fault must be surfaced");

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(inner.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_failure_surfaces_without_retry() {
        let inner = Arc::new(SequencedAiClient::new(vec![Err(
            AppError::InternalServerError("unexpected".to_string()),
        )]));
        let client = RetryingAiClient::with_defaults(inner.clone());

        let err = client
            .exec_chat("test-model", ChatRequest::default(), None)
            .await
            .expect_err("unexpected failure must be surfaced");

        assert!(matches!(err, AppError::ServiceUnavailable(_)));
        assert_eq!(inner.call_count(), 1);
    }

    #[test]
    fn test_backoff_delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay_for_retry(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay_for_retry(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay_for_retry(3), Duration::from_secs(8));
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            classify_failure(&AppError::BadRequest("x".into())),
            FailureClass::ClientFault
        );
        assert_eq!(
            classify_failure(&AppError::ValidationError("x".into())),
            FailureClass::ClientFault
        );
        assert_eq!(classify_failure(&AppError::RateLimited), FailureClass::Transient);
        assert_eq!(
            classify_failure(&AppError::HttpRequestError("x".into())),
            FailureClass::Transient
        );
        assert_eq!(
            classify_failure(&AppError::LlmClientError("x".into())),
            FailureClass::Transient
        );
        assert_eq!(
            classify_failure(&AppError::InternalServerError("x".into())),
            FailureClass::Other
        );
    }
}
