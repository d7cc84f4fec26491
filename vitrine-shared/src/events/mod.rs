/// Store event handling and serialization
///
/// This module defines the events the API publishes to Redis Streams and the
/// conversion to/from the field-value format Redis Streams store:
/// - Event types and the channels they fan out to
/// - Serialization/deserialization for XADD/XREAD
/// - Stream key generation
///
/// # Example
///
/// ```no_run
/// use vitrine_shared::events::{serialize_event, store_stream_key, EventKind, StoreEvent};
/// use serde_json::json;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let event = StoreEvent::new(EventKind::StockUpdate, Uuid::new_v4(), json!({"stock": 3}));
///
/// let fields = serialize_event(&event)?;
/// let key = store_stream_key();
/// println!("XADD {} with {} fields", key, fields.len());
/// # Ok(())
/// # }
/// ```

pub mod serialization;

// Re-export common types
pub use serialization::{
    deserialize_event, product_stream_key, serialize_event, store_stream_key, user_stream_key,
    SerializationError,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// What happened in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProductCreated,
    ProductUpdated,
    ProductDeleted,

    /// Stock level changed for a product
    StockUpdate,

    /// An order was placed
    NewOrder,

    /// An order's fulfilment status advanced
    OrderStatusUpdate,

    /// A wishlist gained or lost an item
    WishlistUpdate,

    ReviewAdded,
    ReviewUpdated,
    ReviewDeleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ProductCreated => "product_created",
            EventKind::ProductUpdated => "product_updated",
            EventKind::ProductDeleted => "product_deleted",
            EventKind::StockUpdate => "stock_update",
            EventKind::NewOrder => "new_order",
            EventKind::OrderStatusUpdate => "order_status_update",
            EventKind::WishlistUpdate => "wishlist_update",
            EventKind::ReviewAdded => "review_added",
            EventKind::ReviewUpdated => "review_updated",
            EventKind::ReviewDeleted => "review_deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "product_created" => EventKind::ProductCreated,
            "product_updated" => EventKind::ProductUpdated,
            "product_deleted" => EventKind::ProductDeleted,
            "stock_update" => EventKind::StockUpdate,
            "new_order" => EventKind::NewOrder,
            "order_status_update" => EventKind::OrderStatusUpdate,
            "wishlist_update" => EventKind::WishlistUpdate,
            "review_added" => EventKind::ReviewAdded,
            "review_updated" => EventKind::ReviewUpdated,
            "review_deleted" => EventKind::ReviewDeleted,
            _ => return None,
        })
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event published to subscribers
///
/// `entity_id` identifies the product, order or wishlist the event concerns;
/// `payload` carries kind-specific details as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEvent {
    pub kind: EventKind,

    pub entity_id: Uuid,

    pub payload: JsonValue,

    pub ts: DateTime<Utc>,
}

impl StoreEvent {
    pub fn new(kind: EventKind, entity_id: Uuid, payload: JsonValue) -> Self {
        Self {
            kind,
            entity_id,
            payload,
            ts: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_string_roundtrip() {
        let kinds = [
            EventKind::ProductCreated,
            EventKind::ProductUpdated,
            EventKind::ProductDeleted,
            EventKind::StockUpdate,
            EventKind::NewOrder,
            EventKind::OrderStatusUpdate,
            EventKind::WishlistUpdate,
            EventKind::ReviewAdded,
            EventKind::ReviewUpdated,
            EventKind::ReviewDeleted,
        ];

        for kind in kinds {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }

        assert_eq!(EventKind::parse("no_such_kind"), None);
    }

    #[test]
    fn test_new_event_carries_entity_id() {
        use serde_json::json;

        let entity_id = Uuid::new_v4();
        let event = StoreEvent::new(EventKind::StockUpdate, entity_id, json!({"stock": 3}));

        assert_eq!(event.kind, EventKind::StockUpdate);
        assert_eq!(event.entity_id, entity_id);
        assert_eq!(event.payload["stock"], 3);
    }
}
