use crate::errors::AppError;
use chrono::{DateTime, Utc};
use qdrant_client::qdrant::Value;
use qdrant_client::qdrant::value::Kind;
use std::collections::HashMap;
use uuid::Uuid;

/// Extracts a string field from a qdrant point payload.
pub fn extract_string(
    payload: &HashMap<String, Value>,
    key: &str,
) -> Result<String, AppError> {
    match payload.get(key).and_then(|value| value.kind.as_ref()) {
        Some(Kind::StringValue(s)) => Ok(s.clone()),
        _ => Err(AppError::SerializationError(format!(
            "Payload field '{key}' is missing or not a string"
        ))),
    }
}

/// Extracts a UUID field (stored as its string form) from a payload.
pub fn extract_uuid(payload: &HashMap<String, Value>, key: &str) -> Result<Uuid, AppError> {
    let raw = extract_string(payload, key)?;
    Uuid::parse_str(&raw).map_err(|e| {
        AppError::SerializationError(format!("Payload field '{key}' is not a valid UUID: {e}"))
    })
}

/// Extracts an RFC 3339 timestamp field from a payload.
pub fn extract_datetime(
    payload: &HashMap<String, Value>,
    key: &str,
) -> Result<DateTime<Utc>, AppError> {
    let raw = extract_string(payload, key)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            AppError::SerializationError(format!(
                "Payload field '{key}' is not a valid RFC 3339 timestamp: {e}"
            ))
        })
}

/// Wraps a string as a qdrant payload value.
pub fn string_value(s: String) -> Value {
    Value {
        kind: Some(Kind::StringValue(s)),
    }
}
