use super::INotificationRepo;
use crate::repos::shared::inmemory_repo::*;
use crate::repos::shared::repo::StorageError;
use calendar_domain::EventNotification;
use std::collections::HashMap;
use std::sync::RwLock;

pub struct InMemoryNotificationRepo {
    notifications: Collection<EventNotification>,
}

impl InMemoryNotificationRepo {
    pub fn new() -> Self {
        Self {
            notifications: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryNotificationRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl INotificationRepo for InMemoryNotificationRepo {
    async fn insert(&self, n: &EventNotification) -> Result<(), StorageError> {
        insert(&n.event_id, n, &self.notifications)
    }

    async fn find(&self, event_id: &str) -> Result<EventNotification, StorageError> {
        find(event_id, &self.notifications)
    }
}
