use diesel::prelude::*;
use genai::chat::{ChatMessage, ChatRequest};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    errors::AppError,
    llm::response_text,
    models::characters::Character,
    models::conversations::{ChatExchangeResponse, MessageRole},
    prompt_builder::{PromptMessage, assemble_prompt},
    schema::{characters, conversations, messages},
    services::chat::message_handling::save_message,
    services::chat::session_management::ConversationPhase,
    services::embeddings::RetrievedMessage,
    state::AppState,
};

/// The message-send operation: verify access, select context, persist the
/// user message, call the model, persist the reply.
///
/// A completion failure after retries leaves the user's message persisted
/// with no assistant reply recorded.
#[instrument(skip(state, content), fields(content_length = content.len()), err)]
pub async fn generate_chat_response(
    state: &AppState,
    user_id: Uuid,
    conversation_id: Uuid,
    content: String,
) -> Result<ChatExchangeResponse, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".into()));
    }

    // 1. Verify ownership, load the character, count stored messages.
    let conn = state.pool.get().await?;
    let (character, prior_message_count) = conn
        .interact(move |conn| {
            let conversation = conversations::table
                .filter(conversations::id.eq(conversation_id))
                .select((conversations::user_id, conversations::character_id))
                .first::<(Uuid, Uuid)>(conn)
                .optional()?;

            let (owner_id, character_id) = match conversation {
                None => return Err(AppError::NotFound("Conversation not found".into())),
                Some((owner_id, _)) if owner_id != user_id => {
                    return Err(AppError::Forbidden);
                }
                Some(pair) => pair,
            };

            let character = characters::table
                .filter(characters::id.eq(character_id))
                .select(Character::as_select())
                .first::<Character>(conn)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => AppError::InternalServerError(
                        "Character missing for existing conversation".to_string(),
                    ),
                    other => AppError::from(other),
                })?;

            let prior_message_count: i64 = messages::table
                .filter(messages::conversation_id.eq(conversation_id))
                .count()
                .get_result(conn)?;

            Ok::<(Character, i64), AppError>((character, prior_message_count))
        })
        .await??;

    // 2. Select context. A conversation with no stored messages has nothing
    //    to retrieve.
    let phase = ConversationPhase::from_message_count(prior_message_count);
    let context: Vec<RetrievedMessage> = match phase {
        ConversationPhase::Started => Vec::new(),
        ConversationPhase::Ongoing => {
            state
                .embedding_pipeline
                .retrieve_relevant_messages(
                    conversation_id,
                    &content,
                    state.config.context_message_limit,
                )
                .await?
        }
    };
    info!(
        ?phase,
        context_messages = context.len(),
        "Context selected for generation"
    );

    // 3. Persist the user message before calling the model.
    let user_message = save_message(
        &state.pool,
        &state.embedding_pipeline,
        conversation_id,
        user_id,
        MessageRole::User,
        content.clone(),
    )
    .await?;

    // 4. Assemble the prompt and call the model through the retrying client.
    let prompt_messages = assemble_prompt(&character, &context, &content);
    let request = to_chat_request(&prompt_messages);
    let response = state
        .ai_client
        .exec_chat(&state.config.chat_model, request, None)
        .await?;
    let reply = response_text(&response)?;

    // 5. Persist the assistant reply.
    let assistant_message = save_message(
        &state.pool,
        &state.embedding_pipeline,
        conversation_id,
        user_id,
        MessageRole::Assistant,
        reply,
    )
    .await?;

    Ok(ChatExchangeResponse {
        user_message,
        assistant_message,
    })
}

fn to_chat_request(prompt_messages: &[PromptMessage]) -> ChatRequest {
    let mut request = ChatRequest::default();
    for message in prompt_messages {
        let chat_message = match message.role {
            MessageRole::System => ChatMessage::system(message.content.clone()),
            MessageRole::User => ChatMessage::user(message.content.clone()),
            MessageRole::Assistant => ChatMessage::assistant(message.content.clone()),
        };
        request = request.append_message(chat_message);
    }
    request
}
