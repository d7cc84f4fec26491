/// Redis integration for event fan-out
///
/// The API publishes store events to Redis Streams and serves them back to
/// browsers over SSE. Streams give us ordered, replayable feeds per channel
/// without a broker deployment.
///
/// - `client`: connection management with health checks
/// - `publisher`: XADD with retry and stream trimming
/// - `subscriber`: backfill (XREAD COUNT) and live tail (XREAD BLOCK)

pub mod client;
pub mod publisher;
pub mod subscriber;

pub use client::{RedisClient, RedisClientError, RedisConfig};
pub use publisher::{EventPublisher, PublisherError};
pub use subscriber::{EventSubscriber, SubscriberError};
