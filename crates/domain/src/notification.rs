use crate::event::Event;
use serde::{Deserialize, Serialize};

/// The message published to the notification queue when an `Event`
/// is due for its reminder. It is never stored by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventNotification {
    pub event_id: String,
    pub title: String,
    /// Start of the `Event`
    pub date: i64,
    /// Owner of the `Event`
    pub user_id: String,
}

impl EventNotification {
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }
}

impl From<&Event> for EventNotification {
    fn from(e: &Event) -> Self {
        Self {
            event_id: e.id.clone(),
            title: e.title.clone(),
            date: e.start_date,
            user_id: e.owner_id.clone(),
        }
    }
}
