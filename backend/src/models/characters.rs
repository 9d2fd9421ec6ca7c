use crate::errors::AppError;
use crate::schema::characters;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// The delimiter earlier revisions used for list-valued fields. The canonical
/// encoding is a JSON array; this is accepted on the read side only.
const LEGACY_LIST_DELIMITER: char = ';';

// Represents a character in the database. List-valued fields are stored as
// JSON-encoded text (see `encode_string_list`).
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = characters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Character {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub nationality: Option<String>,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub background: Option<String>,
    pub personality_traits: Option<String>,
    pub motivations: Option<String>,
    pub quirks_habits: Option<String>,
    pub example_sentences: Option<String>,
    pub is_personal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// For creating a new character row.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = characters)]
pub struct NewCharacter {
    pub user_id: Option<Uuid>,
    pub name: String,
    pub nationality: Option<String>,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub background: Option<String>,
    pub personality_traits: Option<String>,
    pub motivations: Option<String>,
    pub quirks_habits: Option<String>,
    pub example_sentences: Option<String>,
    pub is_personal: bool,
}

// Partial update: `None` fields are left unchanged.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = characters)]
pub struct CharacterChangeset {
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub background: Option<String>,
    pub personality_traits: Option<String>,
    pub motivations: Option<String>,
    pub quirks_habits: Option<String>,
    pub example_sentences: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request body for POST /characters and the shape the AI-generate endpoint
/// must produce.
#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
pub struct CharacterPayload {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub nationality: Option<String>,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub background: Option<String>,
    pub personality_traits: Option<Vec<String>>,
    pub motivations: Option<String>,
    pub quirks_habits: Option<Vec<String>>,
    pub example_sentences: Option<Vec<String>>,
}

impl CharacterPayload {
    /// Builds the insertable row, encoding list fields canonically. Characters
    /// created through the API are always personal and owned by the caller.
    pub fn into_new_character(self, owner_id: Uuid) -> Result<NewCharacter, AppError> {
        Ok(NewCharacter {
            user_id: Some(owner_id),
            name: self.name,
            nationality: self.nationality,
            profession: self.profession,
            description: self.description,
            image_url: self.image_url,
            background: self.background,
            personality_traits: encode_optional_list(self.personality_traits.as_deref())?,
            motivations: self.motivations,
            quirks_habits: encode_optional_list(self.quirks_habits.as_deref())?,
            example_sentences: encode_optional_list(self.example_sentences.as_deref())?,
            is_personal: true,
        })
    }
}

/// Request body for PUT /characters/{id}; absent fields are left unchanged.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateCharacterPayload {
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub background: Option<String>,
    pub personality_traits: Option<Vec<String>>,
    pub motivations: Option<String>,
    pub quirks_habits: Option<Vec<String>>,
    pub example_sentences: Option<Vec<String>>,
}

impl UpdateCharacterPayload {
    pub fn into_changeset(self) -> Result<CharacterChangeset, AppError> {
        Ok(CharacterChangeset {
            name: self.name,
            nationality: self.nationality,
            profession: self.profession,
            description: self.description,
            image_url: self.image_url,
            background: self.background,
            personality_traits: encode_optional_list(self.personality_traits.as_deref())?,
            motivations: self.motivations,
            quirks_habits: encode_optional_list(self.quirks_habits.as_deref())?,
            example_sentences: encode_optional_list(self.example_sentences.as_deref())?,
            updated_at: Some(Utc::now()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.nationality.is_none()
            && self.profession.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.background.is_none()
            && self.personality_traits.is_none()
            && self.motivations.is_none()
            && self.quirks_habits.is_none()
            && self.example_sentences.is_none()
    }
}

/// The client-facing representation, with list fields decoded.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CharacterResponse {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub nationality: Option<String>,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub background: Option<String>,
    pub personality_traits: Option<Vec<String>>,
    pub motivations: Option<String>,
    pub quirks_habits: Option<Vec<String>>,
    pub example_sentences: Option<Vec<String>>,
    pub is_personal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Character> for CharacterResponse {
    fn from(character: Character) -> Self {
        Self {
            id: character.id,
            owner_id: character.user_id,
            name: character.name,
            nationality: character.nationality,
            profession: character.profession,
            description: character.description,
            image_url: character.image_url,
            background: character.background,
            personality_traits: character.personality_traits.as_deref().map(decode_string_list),
            motivations: character.motivations,
            quirks_habits: character.quirks_habits.as_deref().map(decode_string_list),
            example_sentences: character
                .example_sentences
                .as_deref()
                .map(decode_string_list),
            is_personal: character.is_personal,
            created_at: character.created_at,
            updated_at: character.updated_at,
        }
    }
}

/// Encodes a list-valued field as its canonical JSON array text.
pub fn encode_string_list(items: &[String]) -> Result<String, AppError> {
    serde_json::to_string(items).map_err(AppError::from)
}

fn encode_optional_list(items: Option<&[String]>) -> Result<Option<String>, AppError> {
    items.map(encode_string_list).transpose()
}

/// Decodes a stored list-valued field. A value that does not parse as a JSON
/// array is treated as the legacy semicolon-joined form.
pub fn decode_string_list(raw: &str) -> Vec<String> {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
        return items;
    }
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(LEGACY_LIST_DELIMITER)
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
