use super::IEventRepo;
use crate::repos::shared::repo::{non_empty, StorageError};
use calendar_domain::{Event, TimeSpan};
use sqlx::{FromRow, PgPool};

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRaw {
    id: String,
    title: String,
    start_date: i64,
    end_date: i64,
    description: String,
    owner_id: String,
    remind_in: i64,
}

impl From<EventRaw> for Event {
    fn from(e: EventRaw) -> Self {
        Self {
            id: e.id,
            title: e.title,
            start_date: e.start_date,
            end_date: e.end_date,
            description: e.description,
            owner_id: e.owner_id,
            remind_in: e.remind_in,
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for PostgresEventRepo {
    async fn insert(&self, e: &Event) -> Result<(), StorageError> {
        // A single conditional statement, so two concurrent inserts
        // of the same id can not both succeed
        let res = sqlx::query(
            r#"
            INSERT INTO events(
                id,
                title,
                start_date,
                end_date,
                description,
                owner_id,
                remind_in
            )
            VALUES($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&e.id)
        .bind(&e.title)
        .bind(e.start_date)
        .bind(e.end_date)
        .bind(&e.description)
        .bind(&e.owner_id)
        .bind(e.remind_in)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict(e.id.clone()));
        }
        Ok(())
    }

    async fn save(&self, e: &Event) -> Result<(), StorageError> {
        let res = sqlx::query(
            r#"
            UPDATE events SET
                title = $2,
                start_date = $3,
                end_date = $4,
                description = $5,
                owner_id = $6,
                remind_in = $7
            WHERE id = $1
            "#,
        )
        .bind(&e.id)
        .bind(&e.title)
        .bind(e.start_date)
        .bind(e.end_date)
        .bind(&e.description)
        .bind(&e.owner_id)
        .bind(e.remind_in)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound(e.id.clone()));
        }
        Ok(())
    }

    async fn delete(&self, event_id: &str) -> Result<(), StorageError> {
        let res = sqlx::query(
            r#"
            DELETE FROM events AS e
            WHERE e.id = $1
            "#,
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound(event_id.to_string()));
        }
        Ok(())
    }

    async fn find_by_start_date(&self, span: &TimeSpan) -> Result<Vec<Event>, StorageError> {
        let events: Vec<EventRaw> = sqlx::query_as(
            r#"
            SELECT * FROM events AS e
            WHERE e.start_date >= $1 AND e.start_date <= $2
            ORDER BY e.start_date, e.id
            "#,
        )
        .bind(span.start())
        .bind(span.end())
        .fetch_all(&self.pool)
        .await?;

        non_empty(events.into_iter().map(|e| e.into()).collect())
    }

    async fn find_by_remind_in(&self, span: &TimeSpan) -> Result<Vec<Event>, StorageError> {
        let events: Vec<EventRaw> = sqlx::query_as(
            r#"
            SELECT * FROM events AS e
            WHERE e.remind_in >= $1 AND e.remind_in <= $2
            ORDER BY e.remind_in, e.id
            "#,
        )
        .bind(span.start())
        .bind(span.end())
        .fetch_all(&self.pool)
        .await?;

        non_empty(events.into_iter().map(|e| e.into()).collect())
    }
}
