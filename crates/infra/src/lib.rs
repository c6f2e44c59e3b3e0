mod config;
mod mq;
mod repos;
mod system;

pub use config::{Config, NatsConfig};
pub use mq::{
    IMQConsumer, IMQProducer, InMemoryBroker, InMemoryConsumer, InMemoryProducer, MQError,
    MQMessage, NatsConsumer, NatsProducer,
};
pub use repos::{
    IEventRepo, INotificationRepo, InMemoryEventRepo, InMemoryNotificationRepo, Repos,
    StorageError,
};
use std::sync::Arc;
pub use system::{ISys, RealSys};
use tracing::info;

#[derive(Clone)]
pub struct CalendarContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    /// Used instead of NATS when the configured broker url is `memory://`
    pub broker: InMemoryBroker,
}

impl CalendarContext {
    async fn create(config: Config) -> anyhow::Result<Self> {
        let repos = match &config.database_url {
            Some(url) => Repos::create_postgres(url).await?,
            None => Repos::create_inmemory(),
        };
        let broker = InMemoryBroker::with_max_deliver(config.nats.max_deliver);
        Ok(Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            broker,
        })
    }

    /// Context with in-memory repositories and broker
    pub fn create_inmemory(config: Config) -> Self {
        let broker = InMemoryBroker::with_max_deliver(config.nats.max_deliver);
        Self {
            repos: Repos::create_inmemory(),
            config,
            sys: Arc::new(RealSys {}),
            broker,
        }
    }

    pub async fn create_producer(&self) -> Result<Arc<dyn IMQProducer>, MQError> {
        if self.config.nats.is_in_memory() {
            info!("Publishing notifications to the inmemory broker");
            return Ok(Arc::new(InMemoryProducer::new(self.broker.clone())));
        }
        let producer = NatsProducer::connect(self.config.nats.clone()).await?;
        Ok(Arc::new(producer))
    }

    pub async fn create_consumer(&self) -> Result<Arc<dyn IMQConsumer>, MQError> {
        if self.config.nats.is_in_memory() {
            info!("Consuming notifications from the inmemory broker");
            return Ok(Arc::new(InMemoryConsumer::new(self.broker.clone())));
        }
        let consumer = NatsConsumer::connect(self.config.nats.clone()).await?;
        Ok(Arc::new(consumer))
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<CalendarContext> {
    CalendarContext::create(Config::new()).await
}
