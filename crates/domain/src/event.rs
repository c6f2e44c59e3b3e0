use crate::timespan::TimeSpan;
use serde::{Deserialize, Serialize};

/// A calendar `Event` owned by a single user.
///
/// The `id` is chosen by the caller and is the primary key of the `Event`.
/// All timestamps are unix timestamps in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub start_date: i64,
    pub end_date: i64,
    pub description: String,
    pub owner_id: String,
    /// The instant at which the owner should be reminded about the `Event`.
    /// This is an absolute timestamp, not an offset from `start_date`.
    pub remind_in: i64,
}

impl Event {
    pub fn has_valid_dates(&self) -> bool {
        self.start_date <= self.end_date
    }

    pub fn starts_within(&self, span: &TimeSpan) -> bool {
        span.contains(self.start_date)
    }

    pub fn reminds_within(&self, span: &TimeSpan) -> bool {
        span.contains(self.remind_in)
    }
}
