use crate::models::characters::{Character, decode_string_list};
use crate::models::conversations::MessageRole;
use crate::services::embeddings::RetrievedMessage;

/// One entry of the ordered message list sent to the language model.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Renders the character's persona into the system prompt. Pure: the same
/// attributes always produce the same text, and absent fields are omitted.
pub fn build_persona_prompt(character: &Character) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "You are {}, a fictional character. Stay in character at all times and answer as {} would.\n",
        character.name, character.name
    ));

    if let Some(description) = non_empty(character.description.as_deref()) {
        prompt.push_str(&format!("Description: {description}\n"));
    }
    if let Some(nationality) = non_empty(character.nationality.as_deref()) {
        prompt.push_str(&format!("Nationality: {nationality}\n"));
    }
    if let Some(profession) = non_empty(character.profession.as_deref()) {
        prompt.push_str(&format!("Profession: {profession}\n"));
    }
    if let Some(background) = non_empty(character.background.as_deref()) {
        prompt.push_str(&format!("Background: {background}\n"));
    }
    if let Some(traits) = decode_non_empty(character.personality_traits.as_deref()) {
        prompt.push_str(&format!("Personality traits: {}\n", traits.join(", ")));
    }
    if let Some(motivations) = non_empty(character.motivations.as_deref()) {
        prompt.push_str(&format!("Motivations: {motivations}\n"));
    }
    if let Some(quirks) = decode_non_empty(character.quirks_habits.as_deref()) {
        prompt.push_str(&format!("Quirks and habits: {}\n", quirks.join(", ")));
    }
    if let Some(examples) = decode_non_empty(character.example_sentences.as_deref()) {
        prompt.push_str("Example sentences in your voice:\n");
        for sentence in examples {
            prompt.push_str(&format!("- {sentence}\n"));
        }
    }

    prompt
}

/// Assembles the ordered message list for the model: the persona system
/// message, the selected context messages in their original roles
/// (chronological order), then the new user message.
pub fn assemble_prompt(
    character: &Character,
    context: &[RetrievedMessage],
    user_message: &str,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(context.len() + 2);
    messages.push(PromptMessage {
        role: MessageRole::System,
        content: build_persona_prompt(character),
    });

    let mut ordered: Vec<&RetrievedMessage> = context.iter().collect();
    ordered.sort_by(|a, b| a.metadata.timestamp.cmp(&b.metadata.timestamp));
    for retrieved in ordered {
        messages.push(PromptMessage {
            role: retrieved.role,
            content: retrieved.content.clone(),
        });
    }

    messages.push(PromptMessage {
        role: MessageRole::User,
        content: user_message.to_string(),
    });

    messages
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn decode_non_empty(value: Option<&str>) -> Option<Vec<String>> {
    let items = decode_string_list(value?);
    if items.is_empty() { None } else { Some(items) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embeddings::MessageEmbeddingMetadata;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn full_character() -> Character {
        Character {
            id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            name: "Ada".to_string(),
            nationality: Some("British".to_string()),
            profession: Some("Mathematician".to_string()),
            description: Some("A visionary of computation".to_string()),
            image_url: None,
            background: Some("Studied under De Morgan".to_string()),
            personality_traits: Some(r#"["curious","precise"]"#.to_string()),
            motivations: Some("Understanding the analytical engine".to_string()),
            quirks_habits: Some(r#"["writes long footnotes"]"#.to_string()),
            example_sentences: Some(r#"["The engine weaves algebraic patterns."]"#.to_string()),
            is_personal: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn bare_character() -> Character {
        Character {
            id: Uuid::new_v4(),
            user_id: None,
            name: "Ghost".to_string(),
            nationality: None,
            profession: None,
            description: None,
            image_url: None,
            background: None,
            personality_traits: None,
            motivations: None,
            quirks_habits: None,
            example_sentences: None,
            is_personal: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn retrieved(role: MessageRole, content: &str, age_minutes: i64) -> RetrievedMessage {
        let metadata = MessageEmbeddingMetadata {
            message_id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: role.to_string(),
            timestamp: Utc::now() - Duration::minutes(age_minutes),
            text: content.to_string(),
            source_type: "chat_message".to_string(),
        };
        RetrievedMessage::from_metadata(0.5, metadata).unwrap()
    }

    #[test]
    fn test_persona_prompt_is_deterministic() {
        let character = full_character();
        assert_eq!(
            build_persona_prompt(&character),
            build_persona_prompt(&character)
        );
    }

    #[test]
    fn test_persona_prompt_contains_all_present_fields() {
        let prompt = build_persona_prompt(&full_character());
        assert!(prompt.contains("You are Ada"));
        assert!(prompt.contains("Nationality: British"));
        assert!(prompt.contains("Profession: Mathematician"));
        assert!(prompt.contains("Background: Studied under De Morgan"));
        assert!(prompt.contains("Personality traits: curious, precise"));
        assert!(prompt.contains("Quirks and habits: writes long footnotes"));
        assert!(prompt.contains("- The engine weaves algebraic patterns."));
    }

    #[test]
    fn test_persona_prompt_omits_absent_fields() {
        let prompt = build_persona_prompt(&bare_character());
        assert!(prompt.contains("You are Ghost"));
        assert!(!prompt.contains("Nationality:"));
        assert!(!prompt.contains("Profession:"));
        assert!(!prompt.contains("Background:"));
        assert!(!prompt.contains("Personality traits:"));
        assert!(!prompt.contains("Example sentences"));
    }

    #[test]
    fn test_assemble_prompt_ordering() {
        let character = full_character();
        let context = vec![
            retrieved(MessageRole::Assistant, "I replied second", 5),
            retrieved(MessageRole::User, "I asked first", 10),
        ];

        let messages = assemble_prompt(&character, &context, "and now this");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, MessageRole::System);
        // Context is re-ordered chronologically, original roles preserved.
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[1].content, "I asked first");
        assert_eq!(messages[2].role, MessageRole::Assistant);
        assert_eq!(messages[2].content, "I replied second");
        assert_eq!(messages[3].role, MessageRole::User);
        assert_eq!(messages[3].content, "and now this");
    }

    #[test]
    fn test_assemble_prompt_without_context() {
        let character = bare_character();
        let messages = assemble_prompt(&character, &[], "hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
    }
}
