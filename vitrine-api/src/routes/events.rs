/// Store event feed (SSE)
///
/// Streams store events over Server-Sent Events with historical backfill
/// and live tail. Clients resume with `since` (a Redis stream id) or the
/// standard `Last-Event-ID` reconnect mechanism handled by the browser.
///
/// # Endpoint
///
/// `GET /api/events?channel=store|user|product&product_id=<uuid>&since=<id>`
///
/// # Channels
///
/// - `store`: every store-wide event; admin only
/// - `user`: events addressed to the caller (orders, wishlist)
/// - `product`: events for one product; requires `product_id`
///
/// # SSE Event Format
///
/// ```text
/// event: store_event
/// id: 1234567890-0
/// data: {"kind":"stock_update","entity_id":"...","payload":{"stock":3},"ts":"2025-01-04T12:00:00Z"}
///
/// event: heartbeat
/// data: {"alive":true}
/// ```

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::stream::{self, Stream, StreamExt as _};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use uuid::Uuid;
use vitrine_shared::auth::middleware::AuthContext;
use vitrine_shared::events::{product_stream_key, store_stream_key, user_stream_key, StoreEvent};
use vitrine_shared::redis::EventSubscriber;

/// How long each live XREAD blocks before a heartbeat is emitted
const LIVE_READ_TIMEOUT_MS: usize = 5000;

const BACKFILL_BATCH: usize = 1000;

/// Which feed to stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventChannel {
    Store,
    User,
    Product,
}

/// Event feed query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct StreamEventsQuery {
    pub channel: EventChannel,

    /// Required when `channel=product`
    pub product_id: Option<Uuid>,

    /// Redis stream id to resume after; omit for live-only
    pub since: Option<String>,
}

/// SSE heartbeat data
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatData {
    pub alive: bool,
}

/// Event feed endpoint handler
///
/// # Flow
///
/// 1. Resolve the stream key from the channel and enforce access
/// 2. Backfill historical events when `since` is given
/// 3. Live tail with XREAD BLOCK, heartbeat on each idle timeout
///
/// # Errors
///
/// - `400 Bad Request`: `channel=product` without `product_id`
/// - `403 Forbidden`: Non-admin asking for the store channel
pub async fn stream_events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<StreamEventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let stream_key = match query.channel {
        EventChannel::Store => {
            if !auth.is_admin() {
                return Err(ApiError::Forbidden(
                    "Store channel requires admin role".to_string(),
                ));
            }
            store_stream_key()
        }
        EventChannel::User => user_stream_key(auth.user_id),
        EventChannel::Product => {
            let product_id = query.product_id.ok_or_else(|| {
                ApiError::BadRequest("product_id is required for the product channel".to_string())
            })?;
            product_stream_key(product_id)
        }
    };

    tracing::info!(
        user_id = %auth.user_id,
        stream_key = %stream_key,
        since = ?query.since,
        "Streaming store events"
    );

    let stream = create_event_stream(state.subscriber.clone(), stream_key, query.since).await;

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(25))))
}

/// Builds one SSE frame from a stream entry
fn to_sse_event(stream_id: String, event: &StoreEvent) -> Event {
    let frame = Event::default().event("store_event").id(&stream_id);
    match serde_json::to_string(event) {
        Ok(data) => frame.data(data),
        Err(e) => {
            tracing::error!(error = %e, stream_id = %stream_id, "Failed to serialize event");
            frame.data("{}")
        }
    }
}

fn heartbeat() -> Event {
    let frame = Event::default().event("heartbeat");
    match serde_json::to_string(&HeartbeatData { alive: true }) {
        Ok(data) => frame.data(data),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize heartbeat");
            frame.data("{\"alive\":true}")
        }
    }
}

/// Creates the SSE stream with backfill and live tail
///
/// Backfill runs once from `since`; the live tail then blocks on XREAD and
/// emits a heartbeat each time the read times out with nothing new. A Redis
/// error ends the stream and lets the client reconnect with Last-Event-ID.
async fn create_event_stream(
    subscriber: EventSubscriber,
    stream_key: String,
    since: Option<String>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    // Phase 1: backfill from the requested position
    let (backfill, mut last_id) = match &since {
        Some(since_id) => {
            let events = subscriber
                .read_backfill(&stream_key, since_id, BACKFILL_BATCH)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, stream_key = %stream_key, "Backfill read failed");
                    Vec::new()
                });
            let last = events
                .last()
                .map(|(id, _)| id.clone())
                .unwrap_or_else(|| since_id.clone());
            (events, last)
        }
        None => (Vec::new(), "$".to_string()),
    };

    if last_id.is_empty() {
        last_id = "$".to_string();
    }

    let backfill_stream = stream::iter(
        backfill
            .into_iter()
            .map(|(stream_id, event)| Ok(to_sse_event(stream_id, &event))),
    );

    // Phase 2: live tail with heartbeats on idle
    let live_stream = stream::unfold(
        (subscriber, stream_key, last_id),
        |(subscriber, stream_key, last_id)| async move {
            match subscriber
                .read_live(&stream_key, &last_id, LIVE_READ_TIMEOUT_MS)
                .await
            {
                Ok(events) if !events.is_empty() => {
                    let next_id = events
                        .last()
                        .map(|(id, _)| id.clone())
                        .unwrap_or(last_id);
                    let frames: Vec<Result<Event, Infallible>> = events
                        .into_iter()
                        .map(|(stream_id, event)| Ok(to_sse_event(stream_id, &event)))
                        .collect();
                    Some((stream::iter(frames), (subscriber, stream_key, next_id)))
                }
                Ok(_) => {
                    let frame = vec![Ok(heartbeat())];
                    Some((stream::iter(frame), (subscriber, stream_key, last_id)))
                }
                Err(e) => {
                    tracing::error!(error = %e, stream_key = %stream_key, "Live read failed");
                    None
                }
            }
        },
    )
    .flatten();

    backfill_stream.chain(live_stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_deserialization() {
        let query: StreamEventsQuery =
            serde_json::from_str(r#"{"channel":"store"}"#).unwrap();
        assert_eq!(query.channel, EventChannel::Store);
        assert!(query.product_id.is_none());
        assert!(query.since.is_none());
    }

    #[test]
    fn test_heartbeat_data_serialization() {
        let data = HeartbeatData { alive: true };
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, "{\"alive\":true}");
    }
}
