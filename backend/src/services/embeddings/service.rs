use super::metadata::MessageEmbeddingMetadata;
use super::retrieval::RetrievedMessage;
use super::trait_def::EmbeddingPipelineServiceTrait;
use crate::errors::AppError;
use crate::llm::EmbeddingClient;
use crate::models::conversations::Message;
use crate::vector_db::{VectorStore, build_message_point};
use async_trait::async_trait;
use qdrant_client::qdrant::condition::ConditionOneOf;
use qdrant_client::qdrant::r#match::MatchValue;
use qdrant_client::qdrant::{Condition, FieldCondition, Filter, Match};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Similarity search over-fetches by this factor before the conversation
/// post-filter, so that filtering still yields a full result set.
const OVERFETCH_FACTOR: u64 = 2;

/// Upper bound on points scanned when falling back to recency.
const RECENCY_SCAN_LIMIT: u32 = 256;

pub struct EmbeddingPipelineService {
    embedding_client: Arc<dyn EmbeddingClient + Send + Sync>,
    vector_store: Arc<dyn VectorStore + Send + Sync>,
}

impl EmbeddingPipelineService {
    pub fn new(
        embedding_client: Arc<dyn EmbeddingClient + Send + Sync>,
        vector_store: Arc<dyn VectorStore + Send + Sync>,
    ) -> Self {
        Self {
            embedding_client,
            vector_store,
        }
    }

    /// Metadata filter restricting a query to one conversation's points.
    fn conversation_filter(conversation_id: Uuid) -> Filter {
        Filter {
            must: vec![Condition {
                condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                    key: "conversation_id".to_string(),
                    r#match: Some(Match {
                        match_value: Some(MatchValue::Keyword(conversation_id.to_string())),
                    }),
                    ..Default::default()
                })),
            }],
            ..Default::default()
        }
    }

    /// Recency fallback: the most recently stored points for the
    /// conversation, newest first, capped at `limit`.
    #[instrument(skip(self), err)]
    async fn fallback_recent_messages(
        &self,
        conversation_id: Uuid,
        limit: u64,
    ) -> Result<Vec<RetrievedMessage>, AppError> {
        let points = self
            .vector_store
            .scroll_points(Self::conversation_filter(conversation_id), RECENCY_SCAN_LIMIT)
            .await?;

        let mut recovered: Vec<RetrievedMessage> = points
            .into_iter()
            .filter_map(|point| {
                match MessageEmbeddingMetadata::try_from(point.payload) {
                    Ok(metadata) if metadata.conversation_id == conversation_id => {
                        RetrievedMessage::from_metadata(0.0, metadata)
                    }
                    Ok(_) => None,
                    Err(e) => {
                        warn!(error = %e, "Skipping point with unparseable payload during recency fallback");
                        None
                    }
                }
            })
            .collect();

        recovered.sort_by(|a, b| b.metadata.timestamp.cmp(&a.metadata.timestamp));
        recovered.truncate(limit as usize);
        info!(
            count = recovered.len(),
            "Recency fallback selected context messages"
        );
        Ok(recovered)
    }
}

#[async_trait]
impl EmbeddingPipelineServiceTrait for EmbeddingPipelineService {
    #[instrument(skip_all, fields(message_id = %message.id, conversation_id = %message.conversation_id), err)]
    async fn process_and_embed_message(&self, message: &Message) -> Result<(), AppError> {
        if message.content.trim().is_empty() {
            warn!("Message content is empty, skipping embedding");
            return Ok(());
        }

        let embedding_vector = self
            .embedding_client
            .embed_content(&message.content, "RETRIEVAL_DOCUMENT")
            .await?;

        let metadata = MessageEmbeddingMetadata::from_message(message);
        let point = build_message_point(message.id, embedding_vector, metadata.into_payload());

        self.vector_store.upsert_points(vec![point]).await?;
        info!("Message embedded and stored");
        Ok(())
    }

    #[instrument(skip(self, query_text), fields(query_length = query_text.len()), err)]
    async fn retrieve_relevant_messages(
        &self,
        conversation_id: Uuid,
        query_text: &str,
        limit: u64,
    ) -> Result<Vec<RetrievedMessage>, AppError> {
        let query_embedding = self
            .embedding_client
            .embed_content(query_text, "RETRIEVAL_QUERY")
            .await?;

        let search_results = self
            .vector_store
            .search_points(
                query_embedding,
                limit * OVERFETCH_FACTOR,
                Some(Self::conversation_filter(conversation_id)),
            )
            .await?;

        // The filter is part of the query, but payloads are still checked so
        // a stale or mistagged point can never leak across conversations.
        let mut relevant: Vec<RetrievedMessage> = search_results
            .into_iter()
            .filter_map(|scored_point| {
                match MessageEmbeddingMetadata::try_from(scored_point.payload) {
                    Ok(metadata) if metadata.conversation_id == conversation_id => {
                        RetrievedMessage::from_metadata(scored_point.score, metadata)
                    }
                    Ok(metadata) => {
                        warn!(
                            point_conversation_id = %metadata.conversation_id,
                            "Dropping point from another conversation"
                        );
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "Skipping point with unparseable payload");
                        None
                    }
                }
            })
            .collect();
        relevant.truncate(limit as usize);

        if relevant.is_empty() {
            info!("Similarity search returned no conversation matches, falling back to recency");
            return self.fallback_recent_messages(conversation_id, limit).await;
        }

        info!(count = relevant.len(), "Semantic retrieval selected context messages");
        Ok(relevant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::conversations::MessageRole;
    use chrono::{Duration, Utc};
    use qdrant_client::qdrant::{PointStruct, RetrievedPoint, ScoredPoint};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use qdrant_client::qdrant::Value;

    struct MockEmbeddingClient {
        task_types: Mutex<Vec<String>>,
    }

    impl MockEmbeddingClient {
        fn new() -> Self {
            Self {
                task_types: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmbeddingClient for MockEmbeddingClient {
        async fn embed_content(&self, _text: &str, task_type: &str) -> Result<Vec<f32>, AppError> {
            self.task_types.lock().unwrap().push(task_type.to_string());
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    #[derive(Default)]
    struct MockVectorStore {
        search_results: Mutex<Vec<ScoredPoint>>,
        scroll_results: Mutex<Vec<RetrievedPoint>>,
        upserted: Mutex<Vec<PointStruct>>,
        last_search_limit: Mutex<Option<u64>>,
        last_search_had_filter: Mutex<bool>,
        scroll_calls: Mutex<u32>,
    }

    #[async_trait]
    impl VectorStore for MockVectorStore {
        async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<(), AppError> {
            self.upserted.lock().unwrap().extend(points);
            Ok(())
        }

        async fn search_points(
            &self,
            _query_vector: Vec<f32>,
            limit: u64,
            filter: Option<Filter>,
        ) -> Result<Vec<ScoredPoint>, AppError> {
            *self.last_search_limit.lock().unwrap() = Some(limit);
            *self.last_search_had_filter.lock().unwrap() = filter.is_some();
            Ok(self.search_results.lock().unwrap().clone())
        }

        async fn scroll_points(
            &self,
            _filter: Filter,
            _limit: u32,
        ) -> Result<Vec<RetrievedPoint>, AppError> {
            *self.scroll_calls.lock().unwrap() += 1;
            Ok(self.scroll_results.lock().unwrap().clone())
        }
    }

    fn payload_for(
        conversation_id: Uuid,
        role: MessageRole,
        text: &str,
        age_minutes: i64,
    ) -> HashMap<String, Value> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            user_id: Uuid::new_v4(),
            role,
            content: text.to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        };
        MessageEmbeddingMetadata::from_message(&message).into_payload()
    }

    fn scored_point(payload: HashMap<String, Value>, score: f32) -> ScoredPoint {
        ScoredPoint {
            id: Some(Uuid::new_v4().to_string().into()),
            payload,
            score,
            ..Default::default()
        }
    }

    fn retrieved_point(payload: HashMap<String, Value>) -> RetrievedPoint {
        RetrievedPoint {
            id: Some(Uuid::new_v4().to_string().into()),
            payload,
            ..Default::default()
        }
    }

    fn sample_message(conversation_id: Uuid, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id,
            user_id: Uuid::new_v4(),
            role: MessageRole::User,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_retrieval_filters_foreign_conversations() {
        let conversation_id = Uuid::new_v4();
        let other_conversation = Uuid::new_v4();

        let store = Arc::new(MockVectorStore::default());
        *store.search_results.lock().unwrap() = vec![
            scored_point(
                payload_for(conversation_id, MessageRole::User, "about trains", 10),
                0.9,
            ),
            scored_point(
                payload_for(other_conversation, MessageRole::User, "about boats", 5),
                0.8,
            ),
            scored_point(
                payload_for(conversation_id, MessageRole::Assistant, "trains are great", 9),
                0.7,
            ),
        ];

        let service =
            EmbeddingPipelineService::new(Arc::new(MockEmbeddingClient::new()), store.clone());
        let results = service
            .retrieve_relevant_messages(conversation_id, "tell me about trains", 8)
            .await
            .expect("retrieval should succeed");

        assert_eq!(results.len(), 2);
        assert!(
            results
                .iter()
                .all(|r| r.metadata.conversation_id == conversation_id)
        );
        // Over-fetch factor applied, conversation filter pushed into the query.
        assert_eq!(*store.last_search_limit.lock().unwrap(), Some(16));
        assert!(*store.last_search_had_filter.lock().unwrap());
        // No fallback needed.
        assert_eq!(*store.scroll_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_retrieval_truncates_to_limit() {
        let conversation_id = Uuid::new_v4();
        let store = Arc::new(MockVectorStore::default());
        *store.search_results.lock().unwrap() = (0..6)
            .map(|i| {
                scored_point(
                    payload_for(conversation_id, MessageRole::User, &format!("msg {i}"), i),
                    1.0 - (i as f32) * 0.1,
                )
            })
            .collect();

        let service =
            EmbeddingPipelineService::new(Arc::new(MockEmbeddingClient::new()), store);
        let results = service
            .retrieve_relevant_messages(conversation_id, "query", 3)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_zero_hits_fall_back_to_recency() {
        let conversation_id = Uuid::new_v4();
        let other_conversation = Uuid::new_v4();

        let store = Arc::new(MockVectorStore::default());
        // Similarity search returns only another conversation's points.
        *store.search_results.lock().unwrap() = vec![scored_point(
            payload_for(other_conversation, MessageRole::User, "unrelated", 1),
            0.9,
        )];
        *store.scroll_results.lock().unwrap() = vec![
            retrieved_point(payload_for(conversation_id, MessageRole::User, "oldest", 30)),
            retrieved_point(payload_for(conversation_id, MessageRole::Assistant, "newest", 1)),
            retrieved_point(payload_for(other_conversation, MessageRole::User, "foreign", 2)),
            retrieved_point(payload_for(conversation_id, MessageRole::User, "middle", 15)),
        ];

        let service =
            EmbeddingPipelineService::new(Arc::new(MockEmbeddingClient::new()), store.clone());
        let results = service
            .retrieve_relevant_messages(conversation_id, "query", 2)
            .await
            .unwrap();

        assert_eq!(*store.scroll_calls.lock().unwrap(), 1);
        assert_eq!(results.len(), 2);
        // Newest first, same-conversation only.
        assert_eq!(results[0].content, "newest");
        assert_eq!(results[1].content, "middle");
        assert!(
            results
                .iter()
                .all(|r| r.metadata.conversation_id == conversation_id)
        );
    }

    #[tokio::test]
    async fn test_fewer_stored_messages_than_limit() {
        let conversation_id = Uuid::new_v4();
        let store = Arc::new(MockVectorStore::default());
        *store.search_results.lock().unwrap() = vec![scored_point(
            payload_for(conversation_id, MessageRole::User, "only one", 1),
            0.5,
        )];

        let service =
            EmbeddingPipelineService::new(Arc::new(MockEmbeddingClient::new()), store);
        let results = service
            .retrieve_relevant_messages(conversation_id, "query", 8)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_embed_message_uses_document_task_type() {
        let conversation_id = Uuid::new_v4();
        let embedding_client = Arc::new(MockEmbeddingClient::new());
        let store = Arc::new(MockVectorStore::default());

        let service = EmbeddingPipelineService::new(embedding_client.clone(), store.clone());
        service
            .process_and_embed_message(&sample_message(conversation_id, "hello"))
            .await
            .unwrap();

        assert_eq!(
            embedding_client.task_types.lock().unwrap().as_slice(),
            ["RETRIEVAL_DOCUMENT"]
        );
        assert_eq!(store.upserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_embed_message_skips_empty_content() {
        let conversation_id = Uuid::new_v4();
        let store = Arc::new(MockVectorStore::default());
        let service =
            EmbeddingPipelineService::new(Arc::new(MockEmbeddingClient::new()), store.clone());

        service
            .process_and_embed_message(&sample_message(conversation_id, "   "))
            .await
            .unwrap();

        assert!(store.upserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_uses_query_task_type() {
        let conversation_id = Uuid::new_v4();
        let embedding_client = Arc::new(MockEmbeddingClient::new());
        let store = Arc::new(MockVectorStore::default());

        let service = EmbeddingPipelineService::new(embedding_client.clone(), store);
        let _ = service
            .retrieve_relevant_messages(conversation_id, "query", 8)
            .await
            .unwrap();

        assert_eq!(
            embedding_client.task_types.lock().unwrap().as_slice(),
            ["RETRIEVAL_QUERY"]
        );
    }
}
