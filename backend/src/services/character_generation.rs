// backend/src/services/character_generation.rs

use genai::chat::{ChatMessage, ChatRequest};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::AppError,
    llm::response_text,
    models::characters::{Character, CharacterPayload},
    services::character_service::create_character,
    state::AppState,
};

const GENERATION_SYSTEM_PROMPT: &str = "You are an expert at creating fictional characters. \
You will receive some preferences and must return a JSON object only, with these fields \
(set a field to null if it is not relevant): name (string), nationality (string or null), \
profession (string or null), description (string or null), image_url (string or null), \
background (string or null), personality_traits (array of strings or null), \
motivations (string or null), quirks_habits (array of strings or null), \
example_sentences (array of strings or null). \
Return strictly valid JSON. No extra commentary, no markdown code fences.";

/// Renders the user-supplied preferences into the generation prompt.
/// `serde_json::Map` iterates in key order, so the rendering is stable.
pub fn build_generation_prompt(preferences: &Map<String, Value>) -> String {
    let mut prompt_parts = vec![
        "Based on the user preferences, create a fictional character with the following details:"
            .to_string(),
    ];
    for (key, value) in preferences {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        prompt_parts.push(format!("{key}: {rendered}"));
    }
    prompt_parts.push(
        "Remember to strictly output JSON that fits the schema. Do not include any text outside of the JSON."
            .to_string(),
    );
    prompt_parts.join("\n")
}

/// Parses the model's reply into a character payload. Malformed AI output is
/// a validation failure, not a server fault.
pub fn parse_generated_character(raw: &str) -> Result<CharacterPayload, AppError> {
    let payload: CharacterPayload = serde_json::from_str(raw.trim()).map_err(|e| {
        warn!(error = %e, "AI returned unparseable character JSON");
        AppError::ValidationError(format!("Invalid JSON from AI: {e}"))
    })?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(format!("Invalid character from AI: {e}")))?;
    Ok(payload)
}

/// Generates a character from a preferences map via the LLM and persists it
/// as a personal character of the caller.
#[instrument(skip(state, preferences), err)]
pub async fn generate_character(
    state: &AppState,
    user_id: Uuid,
    preferences: &Map<String, Value>,
) -> Result<Character, AppError> {
    let request = ChatRequest::default()
        .append_message(ChatMessage::system(GENERATION_SYSTEM_PROMPT))
        .append_message(ChatMessage::user(build_generation_prompt(preferences)));

    let response = state
        .ai_client
        .exec_chat(&state.config.chat_model, request, None)
        .await?;
    let raw = response_text(&response)?;

    let payload = parse_generated_character(&raw)?;
    info!(name = %payload.name, "AI-generated character parsed");

    let new_character = payload.into_new_character(user_id)?;
    create_character(&state.pool, new_character).await
}
