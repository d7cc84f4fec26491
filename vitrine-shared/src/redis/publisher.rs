/// Redis Stream publisher for store events
///
/// Events are written with XADD plus a MAXLEN ~ trim so per-channel streams
/// stay bounded. Writes retry with exponential backoff; callers that treat
/// events as best-effort use [`EventPublisher::publish_best_effort`], which
/// logs failures instead of surfacing them.
///
/// # Architecture
///
/// ```text
/// API handler
///     │
///     │ publish() / publish_best_effort()
///     ▼
/// EventPublisher
///     │
///     │ XADD events:store        (admin feed)
///     │ XADD events:user:{id}    (personal feed)
///     │ XADD events:product:{id} (product feed)
///     ▼
/// Redis Streams ──> SSE subscribers
/// ```

use crate::events::serialization::{serialize_event, SerializationError};
use crate::events::StoreEvent;
use crate::redis::client::{RedisClient, RedisClientError};
use thiserror::Error;

/// Publisher errors
#[derive(Error, Debug)]
pub enum PublisherError {
    /// Redis client error
    #[error("Redis error: {0}")]
    RedisError(#[from] RedisClientError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerializationError),

    /// Write failed after retries
    #[error("Failed to publish event after {attempts} attempts: {last_error}")]
    PublishFailed { attempts: u32, last_error: String },
}

/// Configuration for publisher retry and trimming behavior
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,

    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,

    /// Approximate cap on entries kept per stream (MAXLEN ~)
    pub stream_max_len: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 100,
            max_retry_delay_ms: 5000,
            stream_max_len: 1000,
        }
    }
}

/// Publishes store events to Redis Streams
#[derive(Clone)]
pub struct EventPublisher {
    client: RedisClient,
    config: PublisherConfig,
}

impl EventPublisher {
    /// Creates a publisher with default configuration
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            config: PublisherConfig::default(),
        }
    }

    /// Creates a publisher with custom retry/trim configuration
    pub fn with_config(client: RedisClient, config: PublisherConfig) -> Self {
        Self { client, config }
    }

    /// Publishes an event to one stream channel
    ///
    /// # Returns
    ///
    /// The Redis Stream entry ID (format: "timestamp-sequence").
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or XADD keeps failing after
    /// all retries.
    pub async fn publish(
        &self,
        stream_key: &str,
        event: &StoreEvent,
    ) -> Result<String, PublisherError> {
        let fields = serialize_event(event)?;

        let stream_id = self
            .xadd_with_retry(stream_key, &fields)
            .await
            .map_err(|e| PublisherError::PublishFailed {
                attempts: self.config.max_retries + 1,
                last_error: e.to_string(),
            })?;

        tracing::debug!(
            kind = %event.kind,
            entity_id = %event.entity_id,
            stream_key = %stream_key,
            stream_id = %stream_id,
            "Published event to Redis Stream"
        );

        Ok(stream_id)
    }

    /// Publishes an event to several channels, logging failures
    ///
    /// Notifications are best-effort: a Redis outage must never fail the
    /// mutation that triggered the event. Each channel is attempted
    /// independently.
    pub async fn publish_best_effort(&self, stream_keys: &[String], event: &StoreEvent) {
        for stream_key in stream_keys {
            if let Err(e) = self.publish(stream_key, event).await {
                tracing::warn!(
                    kind = %event.kind,
                    entity_id = %event.entity_id,
                    stream_key = %stream_key,
                    error = %e,
                    "Failed to publish event, continuing"
                );
            }
        }
    }

    /// Internal: XADD with MAXLEN trim and exponential backoff retry
    async fn xadd_with_retry(
        &self,
        stream_key: &str,
        fields: &std::collections::HashMap<String, String>,
    ) -> Result<String, redis::RedisError> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.config.max_retries {
            let mut conn = self.client.get_connection();

            let mut cmd = redis::cmd("XADD");
            cmd.arg(stream_key)
                .arg("MAXLEN")
                .arg("~")
                .arg(self.config.stream_max_len)
                .arg("*");
            for (key, value) in fields {
                cmd.arg(key).arg(value);
            }

            match cmd.query_async::<_, String>(&mut conn).await {
                Ok(stream_id) => return Ok(stream_id),
                Err(e) => {
                    last_error = Some(e);
                    attempt += 1;

                    if attempt <= self.config.max_retries {
                        let delay_ms = std::cmp::min(
                            self.config.base_retry_delay_ms * 2u64.pow(attempt - 1),
                            self.config.max_retry_delay_ms,
                        );

                        tracing::warn!(
                            stream_key = %stream_key,
                            attempt = attempt,
                            delay_ms = delay_ms,
                            "XADD failed, retrying..."
                        );

                        tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                    }
                }
            }
        }

        // Loop ran at least once, so last_error is set
        Err(last_error.take().unwrap_or_else(|| {
            redis::RedisError::from((redis::ErrorKind::IoError, "XADD retries exhausted"))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{store_stream_key, EventKind};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_publisher_config_default() {
        let config = PublisherConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_retry_delay_ms, 100);
        assert_eq!(config.max_retry_delay_ms, 5000);
        assert_eq!(config.stream_max_len, 1000);
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_publish_event() {
        use crate::redis::client::RedisConfig;

        let config = RedisConfig::default_for_test();
        let client = RedisClient::new(config).await.unwrap();
        let publisher = EventPublisher::new(client);

        let event = StoreEvent::new(EventKind::StockUpdate, Uuid::new_v4(), json!({"stock": 7}));

        let stream_id = publisher
            .publish(&store_stream_key(), &event)
            .await
            .unwrap();
        assert!(stream_id.contains('-')); // Redis stream ID format: timestamp-sequence
    }
}
