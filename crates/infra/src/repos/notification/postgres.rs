use super::INotificationRepo;
use crate::repos::shared::repo::StorageError;
use calendar_domain::EventNotification;
use sqlx::{FromRow, PgPool};

pub struct PostgresNotificationRepo {
    pool: PgPool,
}

impl PostgresNotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRaw {
    event_id: String,
    title: String,
    date: i64,
    user_id: String,
}

impl From<NotificationRaw> for EventNotification {
    fn from(n: NotificationRaw) -> Self {
        Self {
            event_id: n.event_id,
            title: n.title,
            date: n.date,
            user_id: n.user_id,
        }
    }
}

#[async_trait::async_trait]
impl INotificationRepo for PostgresNotificationRepo {
    async fn insert(&self, n: &EventNotification) -> Result<(), StorageError> {
        let res = sqlx::query(
            r#"
            INSERT INTO notifications(event_id, title, date, user_id)
            VALUES($1, $2, $3, $4)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&n.event_id)
        .bind(&n.title)
        .bind(n.date)
        .bind(&n.user_id)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict(n.event_id.clone()));
        }
        Ok(())
    }

    async fn find(&self, event_id: &str) -> Result<EventNotification, StorageError> {
        let notification: Option<NotificationRaw> = sqlx::query_as(
            r#"
            SELECT * FROM notifications AS n
            WHERE n.event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        notification
            .map(|n| n.into())
            .ok_or_else(|| StorageError::NotFound(event_id.to_string()))
    }
}
