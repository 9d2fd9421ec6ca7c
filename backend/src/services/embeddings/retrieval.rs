use super::metadata::MessageEmbeddingMetadata;
use crate::models::conversations::MessageRole;

/// A prior message selected as context for the prompt.
#[derive(Debug, Clone)]
pub struct RetrievedMessage {
    pub score: f32,
    pub role: MessageRole,
    pub content: String,
    pub metadata: MessageEmbeddingMetadata,
}

impl RetrievedMessage {
    pub fn from_metadata(score: f32, metadata: MessageEmbeddingMetadata) -> Option<Self> {
        let role = MessageRole::parse(&metadata.role)?;
        Some(Self {
            score,
            role,
            content: metadata.text.clone(),
            metadata,
        })
    }
}
