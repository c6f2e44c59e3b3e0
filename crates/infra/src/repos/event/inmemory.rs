use super::IEventRepo;
use crate::repos::shared::inmemory_repo::*;
use crate::repos::shared::repo::{non_empty, StorageError};
use calendar_domain::{Event, TimeSpan};
use std::collections::HashMap;
use std::sync::RwLock;

pub struct InMemoryEventRepo {
    events: Collection<Event>,
}

impl InMemoryEventRepo {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryEventRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IEventRepo for InMemoryEventRepo {
    async fn insert(&self, e: &Event) -> Result<(), StorageError> {
        insert(&e.id, e, &self.events)
    }

    async fn save(&self, e: &Event) -> Result<(), StorageError> {
        save(&e.id, e, &self.events)
    }

    async fn delete(&self, event_id: &str) -> Result<(), StorageError> {
        delete(event_id, &self.events).map(|_| ())
    }

    async fn find_by_start_date(&self, span: &TimeSpan) -> Result<Vec<Event>, StorageError> {
        let mut events = find_by(&self.events, |e| e.starts_within(span))?;
        events.sort_by(|e1, e2| (e1.start_date, &e1.id).cmp(&(e2.start_date, &e2.id)));
        non_empty(events)
    }

    async fn find_by_remind_in(&self, span: &TimeSpan) -> Result<Vec<Event>, StorageError> {
        let mut events = find_by(&self.events, |e| e.reminds_within(span))?;
        events.sort_by(|e1, e2| (e1.remind_in, &e1.id).cmp(&(e2.remind_in, &e2.id)));
        non_empty(events)
    }
}
