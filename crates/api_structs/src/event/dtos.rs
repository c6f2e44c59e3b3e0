use calendar_domain::Event;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDTO {
    pub id: String,
    pub title: String,
    pub start_date: i64,
    pub end_date: i64,
    pub description: String,
    pub owner_id: String,
    pub remind_in: i64,
}

impl EventDTO {
    pub fn new(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            start_date: event.start_date,
            end_date: event.end_date,
            description: event.description,
            owner_id: event.owner_id,
            remind_in: event.remind_in,
        }
    }
}
