// backend/src/services/chat/mod.rs

pub mod generation;
pub mod message_handling;
pub mod session_management;

pub use generation::generate_chat_response;
pub use message_handling::save_message;
pub use session_management::{
    ConversationPhase, get_messages_for_conversation, get_or_create_conversation,
    list_conversations_for_user,
};
