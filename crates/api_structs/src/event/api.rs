use crate::dtos::EventDTO;
use calendar_domain::Event;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub event: EventDTO,
}

impl EventResponse {
    pub fn new(event: Event) -> Self {
        Self {
            event: EventDTO::new(event),
        }
    }
}

pub mod create_event {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub id: String,
        pub title: String,
        pub start_date: i64,
        pub end_date: i64,
        #[serde(default)]
        pub description: String,
        pub owner_id: String,
        pub remind_in: i64,
    }

    pub type APIResponse = EventResponse;
}

pub mod update_event {
    use super::*;

    #[derive(Serialize, Deserialize)]
    pub struct PathParams {
        pub event_id: String,
    }

    /// The stored `Event` is replaced by the body, fields left out are not kept
    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub title: String,
        pub start_date: i64,
        pub end_date: i64,
        #[serde(default)]
        pub description: String,
        pub owner_id: String,
        pub remind_in: i64,
    }

    pub type APIResponse = EventResponse;
}

pub mod delete_event {
    use super::*;

    #[derive(Serialize, Deserialize)]
    pub struct PathParams {
        pub event_id: String,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub event_id: String,
    }
}

pub mod get_events {
    use super::*;

    #[derive(Serialize, Deserialize, Debug)]
    pub struct QueryParams {
        pub from: i64,
        pub to: i64,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub events: Vec<EventDTO>,
    }

    impl APIResponse {
        pub fn new(events: Vec<Event>) -> Self {
            Self {
                events: events.into_iter().map(EventDTO::new).collect(),
            }
        }
    }
}
