// backend/src/services/character_service.rs

use diesel::prelude::*;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::characters::{Character, NewCharacter, UpdateCharacterPayload},
    schema::characters,
    state::DbPool,
};

/// Whether the caller may read this character: public characters are visible
/// to everyone, personal characters only to their owner.
pub fn is_visible_to(character: &Character, user_id: Uuid) -> bool {
    !character.is_personal || character.user_id == Some(user_id)
}

/// Whether the caller may update or delete this character. Public seeded
/// characters have no owner and are immutable through the API.
pub fn can_modify(character: &Character, user_id: Uuid) -> bool {
    character.user_id == Some(user_id)
}

/// Lists all characters visible to the caller.
#[instrument(skip(pool), err)]
pub async fn list_characters(pool: &DbPool, user_id: Uuid) -> Result<Vec<Character>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        characters::table
            .filter(
                characters::is_personal
                    .eq(false)
                    .or(characters::user_id.eq(Some(user_id))),
            )
            .select(Character::as_select())
            .order(characters::created_at.asc())
            .load::<Character>(conn)
            .map_err(AppError::from)
    })
    .await?
}

/// Fetches one character, applying the visibility rule. A personal character
/// owned by someone else reads as absent.
#[instrument(skip(pool), err)]
pub async fn get_character(
    pool: &DbPool,
    user_id: Uuid,
    character_id: Uuid,
) -> Result<Character, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let character = characters::table
            .filter(characters::id.eq(character_id))
            .select(Character::as_select())
            .first::<Character>(conn)
            .optional()?;

        match character {
            Some(character) if is_visible_to(&character, user_id) => Ok(character),
            Some(_) => {
                warn!(%character_id, %user_id, "Personal character hidden from non-owner");
                Err(AppError::NotFound("Character not found".into()))
            }
            None => Err(AppError::NotFound("Character not found".into())),
        }
    })
    .await?
}

/// Inserts a new character row.
#[instrument(skip(pool, new_character), fields(name = %new_character.name), err)]
pub async fn create_character(
    pool: &DbPool,
    new_character: NewCharacter,
) -> Result<Character, AppError> {
    let conn = pool.get().await?;
    let character = conn
        .interact(move |conn| {
            diesel::insert_into(characters::table)
                .values(&new_character)
                .returning(Character::as_returning())
                .get_result::<Character>(conn)
                .map_err(AppError::from)
        })
        .await??;

    info!(character_id = %character.id, "Character created");
    Ok(character)
}

/// Applies a partial update, verifying the caller owns the character.
#[instrument(skip(pool, payload), err)]
pub async fn update_character(
    pool: &DbPool,
    user_id: Uuid,
    character_id: Uuid,
    payload: UpdateCharacterPayload,
) -> Result<Character, AppError> {
    if payload.is_empty() {
        return get_character(pool, user_id, character_id).await;
    }
    let changeset = payload.into_changeset()?;

    let conn = pool.get().await?;
    conn.interact(move |conn| {
        conn.transaction(|transaction_conn| {
            let character = characters::table
                .filter(characters::id.eq(character_id))
                .select(Character::as_select())
                .first::<Character>(transaction_conn)
                .optional()?;

            let character = match character {
                None => return Err(AppError::NotFound("Character not found".into())),
                Some(character) => character,
            };
            if !can_modify(&character, user_id) {
                warn!(%character_id, %user_id, "Rejected update of character not owned by caller");
                return Err(AppError::Forbidden);
            }

            diesel::update(characters::table.filter(characters::id.eq(character_id)))
                .set(&changeset)
                .returning(Character::as_returning())
                .get_result::<Character>(transaction_conn)
                .map_err(AppError::from)
        })
    })
    .await?
}

/// Deletes a character, verifying the caller owns it.
#[instrument(skip(pool), err)]
pub async fn delete_character(
    pool: &DbPool,
    user_id: Uuid,
    character_id: Uuid,
) -> Result<(), AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        conn.transaction(|transaction_conn| {
            let character = characters::table
                .filter(characters::id.eq(character_id))
                .select(Character::as_select())
                .first::<Character>(transaction_conn)
                .optional()?;

            let character = match character {
                None => return Err(AppError::NotFound("Character not found".into())),
                Some(character) => character,
            };
            if !can_modify(&character, user_id) {
                warn!(%character_id, %user_id, "Rejected delete of character not owned by caller");
                return Err(AppError::Forbidden);
            }

            diesel::delete(characters::table.filter(characters::id.eq(character_id)))
                .execute(transaction_conn)?;
            info!(%character_id, "Character deleted");
            Ok(())
        })
    })
    .await?
}
