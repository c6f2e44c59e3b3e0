use super::{IMQConsumer, IMQProducer, MQError, MQMessage};
use crate::config::NatsConfig;
use async_nats::jetstream::{self, consumer::pull, consumer::PullConsumer, stream::Stream};
use calendar_domain::EventNotification;
use futures::stream::{BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::info;

async fn connect(config: &NatsConfig) -> Result<async_nats::Client, MQError> {
    info!("Connecting to NATS at: {}", config.url);
    let client = async_nats::connect(&config.url)
        .await
        .map_err(|e| MQError::Connection(e.to_string()))?;
    info!("Connected to NATS");
    Ok(client)
}

/// Gets the notification stream or declares it when it does not exist yet.
/// The stream is a work queue, so a message is removed once it is acknowledged.
async fn declare_stream(js: &jetstream::Context, config: &NatsConfig) -> Result<Stream, MQError> {
    match js.get_stream(&config.stream).await {
        Ok(stream) => Ok(stream),
        Err(_) => {
            info!("Creating stream: {}", config.stream);
            js.create_stream(jetstream::stream::Config {
                name: config.stream.clone(),
                subjects: vec![config.subject.clone()],
                retention: jetstream::stream::RetentionPolicy::WorkQueue,
                storage: jetstream::stream::StorageType::File,
                ..Default::default()
            })
            .await
            .map_err(|e| MQError::Backend(e.to_string()))
        }
    }
}

pub struct NatsProducer {
    config: NatsConfig,
    client: async_nats::Client,
    channel: Mutex<Option<jetstream::Context>>,
}

impl NatsProducer {
    pub async fn connect(config: NatsConfig) -> Result<Self, MQError> {
        let client = connect(&config).await?;
        Ok(Self {
            config,
            client,
            channel: Mutex::new(None),
        })
    }
}

#[async_trait::async_trait]
impl IMQProducer for NatsProducer {
    async fn open_channel(&self) -> Result<(), MQError> {
        let js = jetstream::new(self.client.clone());
        declare_stream(&js, &self.config).await?;
        *self.channel.lock().await = Some(js);
        Ok(())
    }

    async fn publish(&self, payload: Vec<u8>) -> Result<(), MQError> {
        let js = self
            .channel
            .lock()
            .await
            .clone()
            .ok_or(MQError::ChannelNotOpen)?;

        // The second await waits for the stream to store the message
        js.publish(self.config.subject.clone(), payload.into())
            .await
            .map_err(|e| MQError::Publish(e.to_string()))?
            .await
            .map_err(|e| MQError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn close_channel(&self) -> Result<(), MQError> {
        self.channel.lock().await.take();
        Ok(())
    }

    async fn close_connection(&self) -> Result<(), MQError> {
        self.close_channel().await?;
        self.client
            .flush()
            .await
            .map_err(|e| MQError::Backend(e.to_string()))
    }
}

pub struct NatsConsumer {
    config: NatsConfig,
    client: async_nats::Client,
    stream: Mutex<Option<Stream>>,
    consuming: AtomicBool,
    deliveries: Mutex<Option<BoxStream<'static, MQMessage>>>,
}

impl NatsConsumer {
    pub async fn connect(config: NatsConfig) -> Result<Self, MQError> {
        let client = connect(&config).await?;
        Ok(Self {
            config,
            client,
            stream: Mutex::new(None),
            consuming: AtomicBool::new(false),
            deliveries: Mutex::new(None),
        })
    }

    async fn durable_consumer(&self, stream: &Stream) -> Result<PullConsumer, MQError> {
        let name = &self.config.consumer;
        match stream.get_consumer::<pull::Config>(name).await {
            Ok(consumer) => Ok(consumer),
            Err(_) => {
                info!("Creating consumer: {}", name);
                stream
                    .create_consumer(pull::Config {
                        durable_name: Some(name.clone()),
                        filter_subject: self.config.subject.clone(),
                        ack_policy: jetstream::consumer::AckPolicy::Explicit,
                        max_deliver: self.config.max_deliver,
                        ..Default::default()
                    })
                    .await
                    .map_err(|e| MQError::Backend(e.to_string()))
            }
        }
    }
}

#[async_trait::async_trait]
impl IMQConsumer for NatsConsumer {
    async fn open_channel(&self) -> Result<(), MQError> {
        let js = jetstream::new(self.client.clone());
        let stream = declare_stream(&js, &self.config).await?;
        *self.stream.lock().await = Some(stream);
        Ok(())
    }

    async fn begin_consume(&self) -> Result<(), MQError> {
        let stream = self.stream.lock().await;
        let stream = stream.as_ref().ok_or(MQError::ChannelNotOpen)?;
        if self.consuming.load(Ordering::SeqCst) {
            return Err(MQError::AlreadyConsuming);
        }
        let consumer = self.durable_consumer(stream).await?;
        let messages = consumer
            .messages()
            .await
            .map_err(|e| MQError::Backend(e.to_string()))?;

        // Undecodable messages are left unacknowledged and the broker
        // redelivers them until `max_deliver` is reached
        let deliveries = messages
            .then(|delivery| async move {
                let msg = delivery.map_err(|e| MQError::Backend(e.to_string()))?;
                let notification = EventNotification::from_bytes(&msg.payload)?;
                msg.ack().await.map_err(|e| MQError::Backend(e.to_string()))?;
                Ok::<_, MQError>(notification)
            })
            .boxed();

        *self.deliveries.lock().await = Some(deliveries);
        self.consuming.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn receive(&self) -> Result<BoxStream<'static, MQMessage>, MQError> {
        if self.stream.lock().await.is_none() {
            return Err(MQError::ChannelNotOpen);
        }
        self.deliveries
            .lock()
            .await
            .take()
            .ok_or(MQError::NotConsuming)
    }

    async fn close_channel(&self) -> Result<(), MQError> {
        self.deliveries.lock().await.take();
        self.stream.lock().await.take();
        self.consuming.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn close_connection(&self) -> Result<(), MQError> {
        self.close_channel().await?;
        self.client
            .flush()
            .await
            .map_err(|e| MQError::Backend(e.to_string()))
    }
}
