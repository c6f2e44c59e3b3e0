mod inmemory;
mod postgres;

use crate::repos::shared::repo::StorageError;
use calendar_domain::EventNotification;
pub use inmemory::InMemoryNotificationRepo;
pub use postgres::PostgresNotificationRepo;

/// Notifications received by the sender. There is at most one
/// notification per `Event`.
#[async_trait::async_trait]
pub trait INotificationRepo: Send + Sync {
    /// Fails with `StorageError::Conflict` if a notification for the
    /// same event was already recorded
    async fn insert(&self, n: &EventNotification) -> Result<(), StorageError>;
    async fn find(&self, event_id: &str) -> Result<EventNotification, StorageError>;
}

#[cfg(test)]
mod tests {
    use crate::repos::Repos;
    use crate::StorageError;
    use calendar_domain::EventNotification;
    use serial_test::serial;
    use std::time::{SystemTime, UNIX_EPOCH};

    async fn create_repos() -> Vec<Repos> {
        let mut repos = vec![Repos::create_inmemory()];
        if let Ok(url) = std::env::var("DATABASE_URL") {
            repos.push(
                Repos::create_postgres(&url)
                    .await
                    .expect("To connect to postgres"),
            );
        }
        repos
    }

    fn generate_notification() -> EventNotification {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        EventNotification {
            event_id: format!("event-{}", nanos),
            title: "Title".into(),
            date: 100,
            user_id: "user".into(),
        }
    }

    #[tokio::test]
    #[serial]
    async fn records_one_notification_per_event() {
        for repos in create_repos().await {
            let n = generate_notification();
            assert!(repos.notifications.insert(&n).await.is_ok());

            let res = repos.notifications.insert(&n).await;
            assert!(matches!(res, Err(StorageError::Conflict(_))));

            let found = repos
                .notifications
                .find(&n.event_id)
                .await
                .expect("To find notification");
            assert_eq!(found, n);

            let res = repos.notifications.find("missing").await;
            assert!(matches!(res, Err(StorageError::NotFound(_))));
        }
    }
}
