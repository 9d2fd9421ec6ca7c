use super::utils::{extract_datetime, extract_string, extract_uuid, string_value};
use crate::errors::AppError;
use crate::models::conversations::Message;
use chrono::{DateTime, Utc};
use qdrant_client::qdrant::Value;
use std::collections::HashMap;
use uuid::Uuid;

pub const SOURCE_TYPE_CHAT_MESSAGE: &str = "chat_message";

/// Payload stored alongside each message embedding. The relational row is
/// authoritative; this carries what retrieval needs without a DB round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEmbeddingMetadata {
    pub message_id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub source_type: String,
}

impl MessageEmbeddingMetadata {
    pub fn from_message(message: &Message) -> Self {
        Self {
            message_id: message.id,
            conversation_id: message.conversation_id,
            user_id: message.user_id,
            role: message.role.to_string(),
            timestamp: message.created_at,
            text: message.content.clone(),
            source_type: SOURCE_TYPE_CHAT_MESSAGE.to_string(),
        }
    }

    /// Renders the metadata as a qdrant payload map (string values only).
    pub fn into_payload(self) -> HashMap<String, Value> {
        let mut payload = HashMap::new();
        payload.insert(
            "message_id".to_string(),
            string_value(self.message_id.to_string()),
        );
        payload.insert(
            "conversation_id".to_string(),
            string_value(self.conversation_id.to_string()),
        );
        payload.insert("user_id".to_string(), string_value(self.user_id.to_string()));
        payload.insert("role".to_string(), string_value(self.role));
        payload.insert(
            "timestamp".to_string(),
            string_value(self.timestamp.to_rfc3339()),
        );
        payload.insert("text".to_string(), string_value(self.text));
        payload.insert("source_type".to_string(), string_value(self.source_type));
        payload
    }
}

impl TryFrom<HashMap<String, Value>> for MessageEmbeddingMetadata {
    type Error = AppError;

    fn try_from(payload: HashMap<String, Value>) -> Result<Self, Self::Error> {
        Ok(Self {
            message_id: extract_uuid(&payload, "message_id")?,
            conversation_id: extract_uuid(&payload, "conversation_id")?,
            user_id: extract_uuid(&payload, "user_id")?,
            role: extract_string(&payload, "role")?,
            timestamp: extract_datetime(&payload, "timestamp")?,
            text: extract_string(&payload, "text")?,
            source_type: extract_string(&payload, "source_type")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::conversations::MessageRole;

    fn sample_message() -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: MessageRole::User,
            content: "What do you think of engines?".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_payload_round_trip() {
        let message = sample_message();
        let metadata = MessageEmbeddingMetadata::from_message(&message);
        let payload = metadata.clone().into_payload();
        let parsed = MessageEmbeddingMetadata::try_from(payload).expect("payload should parse");
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn test_incomplete_payload_is_rejected() {
        let message = sample_message();
        let mut payload = MessageEmbeddingMetadata::from_message(&message).into_payload();
        payload.remove("conversation_id");
        assert!(MessageEmbeddingMetadata::try_from(payload).is_err());
    }
}
