use diesel::prelude::*;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::conversations::{Conversation, Message, NewConversation},
    schema::{characters, conversations, messages},
    state::DbPool,
};

/// Where a conversation stands in its lifecycle, derived from the stored
/// message count. A conversation that does not exist yet has no phase; it is
/// created by `get_or_create_conversation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationPhase {
    /// Created but no messages stored yet; there is nothing to retrieve.
    Started,
    /// Has stored messages; retrieval selects context from them.
    Ongoing,
}

impl ConversationPhase {
    pub fn from_message_count(count: i64) -> Self {
        if count == 0 {
            Self::Started
        } else {
            Self::Ongoing
        }
    }
}

/// Finds the conversation for (user, character) or creates it. The unique
/// constraint on the pair plus insert-on-conflict makes concurrent start
/// calls converge on a single row.
#[instrument(skip(pool), err)]
pub async fn get_or_create_conversation(
    pool: &DbPool,
    user_id: Uuid,
    character_id: Uuid,
) -> Result<Conversation, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        conn.transaction(|transaction_conn| {
            // The character must exist and be visible to the caller.
            let character_row: Option<(Option<Uuid>, bool)> = characters::table
                .filter(characters::id.eq(character_id))
                .select((characters::user_id, characters::is_personal))
                .first::<(Option<Uuid>, bool)>(transaction_conn)
                .optional()?;

            match character_row {
                None => {
                    warn!(%character_id, "Character not found during conversation start");
                    return Err(AppError::NotFound("Character not found".into()));
                }
                Some((owner_id, is_personal)) => {
                    if is_personal && owner_id != Some(user_id) {
                        warn!(%character_id, %user_id, "User attempted to chat with another user's personal character");
                        return Err(AppError::Forbidden);
                    }
                }
            }

            let new_conversation = NewConversation {
                user_id,
                character_id,
            };
            let inserted: Option<Conversation> = diesel::insert_into(conversations::table)
                .values(&new_conversation)
                .on_conflict((conversations::user_id, conversations::character_id))
                .do_nothing()
                .returning(Conversation::as_returning())
                .get_result(transaction_conn)
                .optional()?;

            match inserted {
                Some(conversation) => {
                    info!(conversation_id = %conversation.id, "Conversation created");
                    Ok(conversation)
                }
                None => {
                    // Lost the upsert race or the pair already existed.
                    let existing = conversations::table
                        .filter(conversations::user_id.eq(user_id))
                        .filter(conversations::character_id.eq(character_id))
                        .select(Conversation::as_select())
                        .first::<Conversation>(transaction_conn)?;
                    info!(conversation_id = %existing.id, "Existing conversation reused");
                    Ok(existing)
                }
            }
        })
    })
    .await?
}

/// Lists the caller's conversations, most recently active first.
#[instrument(skip(pool), err)]
pub async fn list_conversations_for_user(
    pool: &DbPool,
    user_id: Uuid,
) -> Result<Vec<Conversation>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        conversations::table
            .filter(conversations::user_id.eq(user_id))
            .select(Conversation::as_select())
            .order(conversations::updated_at.desc())
            .load::<Conversation>(conn)
            .map_err(AppError::from)
    })
    .await?
}

/// Gets all messages for a conversation in chronological order, verifying
/// ownership.
#[instrument(skip(pool), err)]
pub async fn get_messages_for_conversation(
    pool: &DbPool,
    user_id: Uuid,
    conversation_id: Uuid,
) -> Result<Vec<Message>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let owner_id = conversations::table
            .filter(conversations::id.eq(conversation_id))
            .select(conversations::user_id)
            .first::<Uuid>(conn)
            .optional()?;

        match owner_id {
            None => Err(AppError::NotFound("Conversation not found".into())),
            Some(owner_id) if owner_id != user_id => Err(AppError::Forbidden),
            Some(_) => messages::table
                .filter(messages::conversation_id.eq(conversation_id))
                .select(Message::as_select())
                .order(messages::created_at.asc())
                .load::<Message>(conn)
                .map_err(AppError::from),
        }
    })
    .await?
}
