use calendar_domain::EventNotification;
use calendar_infra::{CalendarContext, IMQConsumer, INotificationRepo, MQError, StorageError};
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Receives the published event notifications and records them.
///
/// A notification is delivered at least once, so the same event can be
/// received several times. Only the first one is recorded.
pub struct NotificationSender {
    consumer: Arc<dyn IMQConsumer>,
    notifications: Arc<dyn INotificationRepo>,
}

impl NotificationSender {
    pub fn new(ctx: &CalendarContext, consumer: Arc<dyn IMQConsumer>) -> Self {
        Self {
            consumer,
            notifications: ctx.repos.notifications.clone(),
        }
    }

    /// Consumes notifications until the token is cancelled or the broker
    /// stops the delivery. The channel and the connection are closed even
    /// when consuming fails.
    pub async fn run(self, token: CancellationToken) -> Result<(), MQError> {
        self.consumer.open_channel().await?;
        let res = self.consume(&token).await;
        if let Err(e) = &res {
            error!(error = %e, "Unable to consume notifications");
        }

        let closed = self.consumer.close_channel().await;
        let disconnected = self.consumer.close_connection().await;
        info!("Notification sender stopped");
        res.and(closed).and(disconnected)
    }

    async fn consume(&self, token: &CancellationToken) -> Result<(), MQError> {
        self.consumer.begin_consume().await?;
        let mut deliveries = self.consumer.receive().await?;
        info!("Notification sender started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                delivery = deliveries.next() => match delivery {
                    Some(Ok(notification)) => self.record(notification).await,
                    Some(Err(e)) => warn!(error = %e, "Skipping a notification that could not be received"),
                    None => {
                        warn!("The broker stopped delivering notifications");
                        break;
                    }
                },
            }
        }
        Ok(())
    }

    async fn record(&self, n: EventNotification) {
        info!(
            event_id = %n.event_id,
            title = %n.title,
            date = n.date,
            user_id = %n.user_id,
            "Received event notification"
        );
        match self.notifications.insert(&n).await {
            Ok(()) => {}
            Err(StorageError::Conflict(_)) => {
                info!(event_id = %n.event_id, "The event notification was already received")
            }
            Err(e) => {
                error!(event_id = %n.event_id, error = %e, "Unable to record the event notification")
            }
        }
    }
}
