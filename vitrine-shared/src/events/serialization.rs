/// Event serialization for Redis Streams
///
/// Redis Streams store entries as field-value string pairs, so structured
/// [`StoreEvent`]s are flattened to a string map before XADD and parsed back
/// after XREAD.
///
/// # Format
///
/// Each event is stored with the following fields:
/// ```text
/// kind: "stock_update"
/// entity_id: "550e8400-e29b-41d4-a716-446655440000"
/// payload: "{\"stock\":3}"
/// ts: "2025-01-03T12:00:00Z"
/// ```
///
/// # Stream Naming
///
/// - `events:store` - store-wide feed (all admin-facing events)
/// - `events:user:{user_id}` - per-user feed (own orders, own wishlist)
/// - `events:product:{product_id}` - per-product feed (stock, reviews)
///
/// # Example
///
/// ```
/// use vitrine_shared::events::{serialize_event, deserialize_event, EventKind, StoreEvent};
/// use serde_json::json;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let event = StoreEvent::new(EventKind::NewOrder, Uuid::new_v4(), json!({"total": 120.0}));
///
/// let fields = serialize_event(&event)?;
/// let roundtrip = deserialize_event(&fields)?;
/// assert_eq!(event.kind, roundtrip.kind);
/// # Ok(())
/// # }
/// ```

use super::{EventKind, StoreEvent};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializationError {
    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid field value
    #[error("Invalid field value for {field}: {error}")]
    InvalidValue { field: String, error: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// UUID parsing error
    #[error("UUID error: {0}")]
    UuidError(#[from] uuid::Error),

    /// Timestamp parsing error
    #[error("Timestamp error: {0}")]
    TimestampError(String),
}

/// Serializes a StoreEvent to Redis Stream field-value pairs
///
/// Returns a string map ready for XADD.
pub fn serialize_event(event: &StoreEvent) -> Result<HashMap<String, String>, SerializationError> {
    let mut fields = HashMap::new();

    fields.insert("kind".to_string(), event.kind.as_str().to_string());
    fields.insert("entity_id".to_string(), event.entity_id.to_string());

    let payload_json = serde_json::to_string(&event.payload)?;
    fields.insert("payload".to_string(), payload_json);

    fields.insert("ts".to_string(), event.ts.to_rfc3339());

    Ok(fields)
}

/// Deserializes a StoreEvent from Redis Stream field-value pairs
///
/// # Errors
///
/// Returns an error if required fields are missing or malformed (unknown
/// kind, invalid UUID, timestamp or JSON).
pub fn deserialize_event(
    fields: &HashMap<String, String>,
) -> Result<StoreEvent, SerializationError> {
    let kind_str = fields
        .get("kind")
        .ok_or_else(|| SerializationError::MissingField("kind".to_string()))?;
    let kind = EventKind::parse(kind_str).ok_or_else(|| SerializationError::InvalidValue {
        field: "kind".to_string(),
        error: format!("unknown event kind: {}", kind_str),
    })?;

    let entity_id_str = fields
        .get("entity_id")
        .ok_or_else(|| SerializationError::MissingField("entity_id".to_string()))?;
    let entity_id = Uuid::parse_str(entity_id_str)?;

    let payload_str = fields
        .get("payload")
        .ok_or_else(|| SerializationError::MissingField("payload".to_string()))?;
    let payload: JsonValue = serde_json::from_str(payload_str)?;

    let ts_str = fields
        .get("ts")
        .ok_or_else(|| SerializationError::MissingField("ts".to_string()))?;
    let ts = DateTime::parse_from_rfc3339(ts_str)
        .map_err(|e| SerializationError::TimestampError(e.to_string()))?
        .with_timezone(&Utc);

    Ok(StoreEvent {
        kind,
        entity_id,
        payload,
        ts,
    })
}

/// Stream key for the store-wide feed
pub fn store_stream_key() -> String {
    "events:store".to_string()
}

/// Stream key for a user's personal feed
pub fn user_stream_key(user_id: Uuid) -> String {
    format!("events:user:{}", user_id)
}

/// Stream key for a product's feed
pub fn product_stream_key(product_id: Uuid) -> String {
    format!("events:product:{}", product_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_event() -> StoreEvent {
        StoreEvent {
            kind: EventKind::StockUpdate,
            entity_id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            payload: json!({"stock": 3, "title": "Linen Shirt"}),
            ts: DateTime::parse_from_rfc3339("2025-01-03T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_serialize_event() {
        let event = create_test_event();
        let fields = serialize_event(&event).unwrap();

        assert_eq!(fields.get("kind").unwrap(), "stock_update");
        assert_eq!(
            fields.get("entity_id").unwrap(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(fields.get("ts").unwrap(), "2025-01-03T12:00:00+00:00");
        assert!(fields.get("payload").unwrap().contains("Linen Shirt"));
    }

    #[test]
    fn test_deserialize_event() {
        let event = create_test_event();
        let fields = serialize_event(&event).unwrap();
        let roundtrip = deserialize_event(&fields).unwrap();

        assert_eq!(roundtrip, event);
    }

    #[test]
    fn test_deserialize_missing_field() {
        let mut fields = HashMap::new();
        fields.insert("kind".to_string(), "stock_update".to_string());
        // Missing entity_id

        let result = deserialize_event(&fields);
        assert!(matches!(
            result.unwrap_err(),
            SerializationError::MissingField(_)
        ));
    }

    #[test]
    fn test_deserialize_unknown_kind() {
        let event = create_test_event();
        let mut fields = serialize_event(&event).unwrap();
        fields.insert("kind".to_string(), "mystery".to_string());

        let result = deserialize_event(&fields);
        assert!(matches!(
            result.unwrap_err(),
            SerializationError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_deserialize_invalid_uuid() {
        let event = create_test_event();
        let mut fields = serialize_event(&event).unwrap();
        fields.insert("entity_id".to_string(), "not-a-uuid".to_string());

        let result = deserialize_event(&fields);
        assert!(matches!(result.unwrap_err(), SerializationError::UuidError(_)));
    }

    #[test]
    fn test_deserialize_invalid_json() {
        let event = create_test_event();
        let mut fields = serialize_event(&event).unwrap();
        fields.insert("payload".to_string(), "{invalid json}".to_string());

        let result = deserialize_event(&fields);
        assert!(matches!(result.unwrap_err(), SerializationError::JsonError(_)));
    }

    #[test]
    fn test_stream_key_generation() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();

        assert_eq!(store_stream_key(), "events:store");
        assert_eq!(
            user_stream_key(id),
            "events:user:550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(
            product_stream_key(id),
            "events:product:550e8400-e29b-41d4-a716-446655440000"
        );
    }
}
