/// Redis Stream subscriber for consuming store events
///
/// Two read modes back the SSE endpoint:
/// - **Backfill**: XREAD with COUNT fetches history non-blocking
/// - **Live tail**: XREAD BLOCK waits for new entries with a timeout
///
/// # Example - Live Tail
///
/// ```no_run
/// use vitrine_shared::redis::client::{RedisClient, RedisConfig};
/// use vitrine_shared::redis::subscriber::EventSubscriber;
/// use vitrine_shared::events::store_stream_key;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = RedisConfig::from_env()?;
/// let client = RedisClient::new(config).await?;
/// let subscriber = EventSubscriber::new(client);
///
/// let key = store_stream_key();
/// let mut last_id = "$".to_string(); // Start from end
///
/// loop {
///     let events = subscriber.read_live(&key, &last_id, 5000).await?;
///     for (stream_id, event) in events {
///         println!("New event: {}", event.kind);
///         last_id = stream_id;
///     }
/// }
/// # Ok(())
/// # }
/// ```

use crate::events::serialization::{deserialize_event, SerializationError};
use crate::events::StoreEvent;
use crate::redis::client::{RedisClient, RedisClientError};
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::collections::HashMap;
use thiserror::Error;

/// Subscriber errors
#[derive(Error, Debug)]
pub enum SubscriberError {
    /// Redis client error
    #[error("Redis error: {0}")]
    RedisError(#[from] RedisClientError),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] SerializationError),

    /// Raw Redis error
    #[error("Redis command error: {0}")]
    RedisCommandError(#[from] redis::RedisError),
}

/// Configuration for subscriber behavior
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Default batch size for backfill reads
    pub default_batch_size: usize,

    /// Cap on batch size to bound memory
    pub max_batch_size: usize,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            default_batch_size: 100,
            max_batch_size: 1000,
        }
    }
}

/// Reads store events back out of Redis Streams
#[derive(Clone)]
pub struct EventSubscriber {
    client: RedisClient,
    config: SubscriberConfig,
}

impl EventSubscriber {
    /// Creates a subscriber with default configuration
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            config: SubscriberConfig::default(),
        }
    }

    pub fn with_config(client: RedisClient, config: SubscriberConfig) -> Self {
        Self { client, config }
    }

    /// Reads historical events from a stream, non-blocking
    ///
    /// # Arguments
    ///
    /// * `stream_key` - Channel to read (see `events::serialization`)
    /// * `since_id` - Stream ID to start after ("0" for the beginning)
    /// * `count` - Maximum entries to fetch, capped by `max_batch_size`
    ///
    /// # Returns
    ///
    /// (stream_id, event) tuples in chronological order. Entries that fail
    /// to deserialize are logged and skipped so one bad entry cannot wedge
    /// a feed.
    pub async fn read_backfill(
        &self,
        stream_key: &str,
        since_id: &str,
        count: usize,
    ) -> Result<Vec<(String, StoreEvent)>, SubscriberError> {
        let safe_count = std::cmp::min(count, self.config.max_batch_size);

        let mut conn = self.client.get_connection();
        let opts = StreamReadOptions::default().count(safe_count);
        let reply: StreamReadReply = conn
            .xread_options(&[stream_key], &[since_id], &opts)
            .await?;

        let events = Self::parse_reply(stream_key, reply);

        tracing::debug!(
            stream_key = %stream_key,
            since_id = %since_id,
            count = events.len(),
            "Backfilled events from Redis Stream"
        );

        Ok(events)
    }

    /// Waits for new events on a stream
    ///
    /// Blocks up to `timeout_ms`; an empty result means the timeout fired
    /// without new entries, which callers treat as a heartbeat tick.
    pub async fn read_live(
        &self,
        stream_key: &str,
        last_id: &str,
        timeout_ms: usize,
    ) -> Result<Vec<(String, StoreEvent)>, SubscriberError> {
        let mut conn = self.client.get_connection();

        let opts = StreamReadOptions::default()
            .count(self.config.default_batch_size)
            .block(timeout_ms);
        let reply: StreamReadReply = conn.xread_options(&[stream_key], &[last_id], &opts).await?;

        Ok(Self::parse_reply(stream_key, reply))
    }

    /// Parses an XREAD reply, skipping undecodable entries
    fn parse_reply(stream_key: &str, reply: StreamReadReply) -> Vec<(String, StoreEvent)> {
        let mut events = Vec::new();

        for stream in reply.keys {
            for entry in stream.ids {
                let stream_id = entry.id;

                let fields: HashMap<String, String> = entry
                    .map
                    .into_iter()
                    .filter_map(|(k, v)| {
                        let value = redis::from_redis_value::<String>(&v).ok()?;
                        Some((k, value))
                    })
                    .collect();

                match deserialize_event(&fields) {
                    Ok(event) => events.push((stream_id, event)),
                    Err(e) => {
                        tracing::error!(
                            stream_key = %stream_key,
                            stream_id = %stream_id,
                            error = %e,
                            "Failed to deserialize event, skipping"
                        );
                    }
                }
            }
        }

        events
    }
}
