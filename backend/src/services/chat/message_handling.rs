use diesel::prelude::*;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::conversations::{Message, MessageRole, NewMessage},
    schema::{conversations, messages},
    services::embeddings::EmbeddingPipelineServiceTrait,
    state::DbPool,
};

/// Persists one chat message in its own transaction (also bumping the
/// conversation's activity timestamp), then writes the embedding as a
/// best-effort side step. If the embedding write fails, the relational copy
/// is still authoritative; the message is just unreachable to semantic
/// retrieval until reindexed.
#[instrument(skip(pool, embedding_pipeline, content), err)]
pub async fn save_message(
    pool: &DbPool,
    embedding_pipeline: &Arc<dyn EmbeddingPipelineServiceTrait + Send + Sync>,
    conversation_id: Uuid,
    user_id: Uuid,
    role: MessageRole,
    content: String,
) -> Result<Message, AppError> {
    let conn = pool.get().await?;
    let saved_message = conn
        .interact(move |conn| {
            conn.transaction(|transaction_conn| {
                let new_message = NewMessage::new(conversation_id, user_id, role, content);
                let inserted: Message = diesel::insert_into(messages::table)
                    .values(&new_message)
                    .returning(Message::as_returning())
                    .get_result(transaction_conn)?;

                diesel::update(
                    conversations::table.filter(conversations::id.eq(conversation_id)),
                )
                .set(conversations::updated_at.eq(chrono::Utc::now()))
                .execute(transaction_conn)?;

                Ok::<Message, AppError>(inserted)
            })
        })
        .await??;

    info!(message_id = %saved_message.id, role = %saved_message.role, "Chat message persisted");

    // Best-effort: no two-phase guarantee with the vector store.
    if let Err(e) = embedding_pipeline
        .process_and_embed_message(&saved_message)
        .await
    {
        warn!(
            message_id = %saved_message.id,
            error = %e,
            "Embedding side step failed; message remains authoritative in the database"
        );
    }

    Ok(saved_message)
}
