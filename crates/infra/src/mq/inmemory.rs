use super::{IMQConsumer, IMQProducer, MQError, MQMessage};
use calendar_domain::EventNotification;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::warn;

const DEFAULT_MAX_DELIVER: i64 = 5;

struct Delivery {
    payload: Vec<u8>,
    attempts: i64,
}

struct Queue {
    messages: Mutex<VecDeque<Delivery>>,
    published: Notify,
    max_deliver: i64,
}

/// Queue shared by the producers and consumers of one process.
///
/// Every message is handed to one consumer at a time. A message that can not
/// be decoded is put back at the end of the queue until it has been delivered
/// `max_deliver` times, the same bound the NATS consumer uses.
#[derive(Clone)]
pub struct InMemoryBroker {
    queue: Arc<Queue>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::with_max_deliver(DEFAULT_MAX_DELIVER)
    }

    pub fn with_max_deliver(max_deliver: i64) -> Self {
        Self {
            queue: Arc::new(Queue {
                messages: Mutex::new(VecDeque::new()),
                published: Notify::new(),
                max_deliver: max_deliver.max(1),
            }),
        }
    }

    /// Number of messages waiting for delivery, redeliveries included
    pub fn pending(&self) -> usize {
        self.queue
            .messages
            .lock()
            .map(|messages| messages.len())
            .unwrap_or_default()
    }

    fn messages(&self) -> Result<MutexGuard<'_, VecDeque<Delivery>>, MQError> {
        self.queue
            .messages
            .lock()
            .map_err(|_| MQError::Backend("The inmemory queue lock is poisoned".into()))
    }

    fn push(&self, payload: Vec<u8>) -> Result<(), MQError> {
        self.messages()?.push_back(Delivery {
            payload,
            attempts: 0,
        });
        self.queue.published.notify_one();
        Ok(())
    }

    async fn pop(&self) -> Result<Delivery, MQError> {
        loop {
            let next = self.messages()?.pop_front();
            match next {
                Some(mut delivery) => {
                    delivery.attempts += 1;
                    return Ok(delivery);
                }
                None => self.queue.published.notified().await,
            }
        }
    }

    /// Puts back a delivery that was not acknowledged
    fn redeliver(&self, delivery: Delivery) -> Result<(), MQError> {
        if delivery.attempts >= self.queue.max_deliver {
            warn!(
                attempts = delivery.attempts,
                "Dropping a message that was never acknowledged"
            );
            return Ok(());
        }
        self.messages()?.push_back(delivery);
        self.queue.published.notify_one();
        Ok(())
    }

    async fn receive(&self) -> MQMessage {
        let delivery = self.pop().await?;
        match EventNotification::from_bytes(&delivery.payload) {
            Ok(notification) => Ok(notification),
            Err(e) => {
                self.redeliver(delivery)?;
                Err(MQError::from(e))
            }
        }
    }
}

pub struct InMemoryProducer {
    broker: InMemoryBroker,
    open: AtomicBool,
}

impl InMemoryProducer {
    pub fn new(broker: InMemoryBroker) -> Self {
        Self {
            broker,
            open: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl IMQProducer for InMemoryProducer {
    async fn open_channel(&self) -> Result<(), MQError> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn publish(&self, payload: Vec<u8>) -> Result<(), MQError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(MQError::ChannelNotOpen);
        }
        self.broker.push(payload)
    }

    async fn close_channel(&self) -> Result<(), MQError> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn close_connection(&self) -> Result<(), MQError> {
        self.close_channel().await
    }
}

pub struct InMemoryConsumer {
    broker: InMemoryBroker,
    open: AtomicBool,
    consuming: AtomicBool,
    deliveries: tokio::sync::Mutex<Option<BoxStream<'static, MQMessage>>>,
}

impl InMemoryConsumer {
    pub fn new(broker: InMemoryBroker) -> Self {
        Self {
            broker,
            open: AtomicBool::new(false),
            consuming: AtomicBool::new(false),
            deliveries: tokio::sync::Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl IMQConsumer for InMemoryConsumer {
    async fn open_channel(&self) -> Result<(), MQError> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn begin_consume(&self) -> Result<(), MQError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(MQError::ChannelNotOpen);
        }
        if self.consuming.swap(true, Ordering::SeqCst) {
            return Err(MQError::AlreadyConsuming);
        }
        let deliveries = stream::unfold(self.broker.clone(), |broker| async move {
            let delivery = broker.receive().await;
            Some((delivery, broker))
        })
        .boxed();
        *self.deliveries.lock().await = Some(deliveries);
        Ok(())
    }

    async fn receive(&self) -> Result<BoxStream<'static, MQMessage>, MQError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(MQError::ChannelNotOpen);
        }
        self.deliveries
            .lock()
            .await
            .take()
            .ok_or(MQError::NotConsuming)
    }

    async fn close_channel(&self) -> Result<(), MQError> {
        self.open.store(false, Ordering::SeqCst);
        self.consuming.store(false, Ordering::SeqCst);
        self.deliveries.lock().await.take();
        Ok(())
    }

    async fn close_connection(&self) -> Result<(), MQError> {
        self.close_channel().await
    }
}
