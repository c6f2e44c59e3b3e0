mod inmemory;
mod postgres;

use crate::repos::shared::repo::StorageError;
use calendar_domain::{Event, TimeSpan};
pub use inmemory::InMemoryEventRepo;
pub use postgres::PostgresEventRepo;

/// Storage of `Event`s.
///
/// Queries return `StorageError::Empty` instead of an empty list when
/// nothing matches.
#[async_trait::async_trait]
pub trait IEventRepo: Send + Sync {
    /// Fails with `StorageError::Conflict` if the id is taken
    async fn insert(&self, e: &Event) -> Result<(), StorageError>;
    /// Replaces the whole stored `Event`. Fails with `StorageError::NotFound`
    /// if there is no `Event` with the same id.
    async fn save(&self, e: &Event) -> Result<(), StorageError>;
    async fn delete(&self, event_id: &str) -> Result<(), StorageError>;
    /// All `Event`s with a `start_date` inside the span, bounds included
    async fn find_by_start_date(&self, span: &TimeSpan) -> Result<Vec<Event>, StorageError>;
    /// All `Event`s with a `remind_in` inside the span, bounds included
    async fn find_by_remind_in(&self, span: &TimeSpan) -> Result<Vec<Event>, StorageError>;
}
