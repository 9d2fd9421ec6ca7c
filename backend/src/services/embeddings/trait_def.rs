use super::retrieval::RetrievedMessage;
use crate::errors::AppError;
use crate::models::conversations::Message;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait EmbeddingPipelineServiceTrait: Send + Sync {
    /// Embeds a single chat message and stores it in the vector index.
    async fn process_and_embed_message(&self, message: &Message) -> Result<(), AppError>;

    /// Retrieves up to `limit` prior messages relevant to `query_text`,
    /// restricted to the given conversation. Falls back to the most recently
    /// stored messages when similarity search yields nothing.
    async fn retrieve_relevant_messages(
        &self,
        conversation_id: Uuid,
        query_text: &str,
        limit: u64,
    ) -> Result<Vec<RetrievedMessage>, AppError>;
}
