mod inmemory;
mod nats;

use calendar_domain::EventNotification;
use futures::stream::BoxStream;
pub use inmemory::{InMemoryBroker, InMemoryConsumer, InMemoryProducer};
pub use nats::{NatsConsumer, NatsProducer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MQError {
    #[error("The channel is not open")]
    ChannelNotOpen,
    #[error("The consumer has not started consuming")]
    NotConsuming,
    #[error("The channel is already consuming, reopen it to consume again")]
    AlreadyConsuming,
    #[error("Unable to connect to the broker: {0}")]
    Connection(String),
    #[error("Unable to publish the message: {0}")]
    Publish(String),
    #[error("Unable to decode the notification: {0}")]
    Deserialization(#[from] serde_json::Error),
    #[error("The broker failed: {0}")]
    Backend(String),
}

/// A received delivery. Only successfully decoded notifications have been
/// acknowledged to the broker.
pub type MQMessage = Result<EventNotification, MQError>;

/// Publishing side of the notification queue.
///
/// `publish` is only valid between `open_channel` and `close_channel`.
#[async_trait::async_trait]
pub trait IMQProducer: Send + Sync {
    async fn open_channel(&self) -> Result<(), MQError>;
    async fn publish(&self, payload: Vec<u8>) -> Result<(), MQError>;
    async fn close_channel(&self) -> Result<(), MQError>;
    async fn close_connection(&self) -> Result<(), MQError>;
}

/// Consuming side of the notification queue.
#[async_trait::async_trait]
pub trait IMQConsumer: Send + Sync {
    async fn open_channel(&self) -> Result<(), MQError>;
    /// Starts the single consume session of an open channel
    async fn begin_consume(&self) -> Result<(), MQError>;
    /// Hands out the deliveries of the current consume session. The
    /// sequence can only be taken once per `begin_consume`, reopen the
    /// channel to receive again.
    async fn receive(&self) -> Result<BoxStream<'static, MQMessage>, MQError>;
    async fn close_channel(&self) -> Result<(), MQError>;
    async fn close_connection(&self) -> Result<(), MQError>;
}
