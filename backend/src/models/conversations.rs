use crate::models::characters::Character;
use crate::models::users::User;
use crate::schema::{conversations, messages};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

// Import necessary Diesel traits for manual enum mapping
use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::{AsExpression, FromSqlRow};
use std::io::Write;

// Represents a conversation: the unique pairing of one user and one character.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(belongs_to(User, foreign_key = user_id))]
#[diesel(belongs_to(Character, foreign_key = character_id))]
#[diesel(table_name = conversations)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub character_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// For creating a new conversation
#[derive(Insertable, Debug)]
#[diesel(table_name = conversations)]
pub struct NewConversation {
    pub user_id: Uuid,
    pub character_id: Uuid,
}

// Enum to represent the role of the sender
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = crate::schema::sql_types::MessageType)]
pub enum MessageRole {
    #[default]
    User,
    Assistant,
    System,
}

// Manual ToSql implementation
impl ToSql<crate::schema::sql_types::MessageType, Pg> for MessageRole {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            MessageRole::User => out.write_all(b"User")?,
            MessageRole::Assistant => out.write_all(b"Assistant")?,
            MessageRole::System => out.write_all(b"System")?,
        }
        Ok(IsNull::No)
    }
}

// Manual FromSql implementation
impl FromSql<crate::schema::sql_types::MessageType, Pg> for MessageRole {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"User" => Ok(MessageRole::User),
            b"Assistant" => Ok(MessageRole::Assistant),
            b"System" => Ok(MessageRole::System),
            unrecognized => {
                error!(
                    "Unrecognized message_type enum variant from DB: {:?}",
                    String::from_utf8_lossy(unrecognized)
                );
                Err("Unrecognized enum variant from database".into())
            }
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "User"),
            MessageRole::Assistant => write!(f, "Assistant"),
            MessageRole::System => write!(f, "System"),
        }
    }
}

impl MessageRole {
    /// Parses the role string stored in embedding payloads.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "User" => Some(MessageRole::User),
            "Assistant" => Some(MessageRole::Assistant),
            "System" => Some(MessageRole::System),
            _ => None,
        }
    }
}

// Represents a chat message in the database
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(belongs_to(Conversation, foreign_key = conversation_id))]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    #[diesel(column_name = message_type)]
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// For inserting a new chat message
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    #[diesel(column_name = message_type)]
    pub role: MessageRole,
    pub content: String,
}

impl NewMessage {
    pub fn new(conversation_id: Uuid, user_id: Uuid, role: MessageRole, content: String) -> Self {
        Self {
            conversation_id,
            user_id,
            role,
            content,
        }
    }
}

/// Request body for POST /chat/message/{conversation_id}.
#[derive(Deserialize, Serialize, Debug)]
pub struct SendMessagePayload {
    pub message: String,
}

/// Response body for a completed exchange: both persisted messages.
#[derive(Serialize, Debug, Clone)]
pub struct ChatExchangeResponse {
    pub user_message: Message,
    pub assistant_message: Message,
}
