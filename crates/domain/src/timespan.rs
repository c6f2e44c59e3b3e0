use thiserror::Error;

/// Closed range of unix timestamps, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    start: i64,
    end: i64,
}

#[derive(Error, Debug, PartialEq)]
#[error("Provided timespan start: {0} and end: {1} is invalid. The start can not be after the end.")]
pub struct InvalidTimeSpanError(pub i64, pub i64);

impl TimeSpan {
    pub fn new(start: i64, end: i64) -> Result<Self, InvalidTimeSpanError> {
        if start > end {
            return Err(InvalidTimeSpanError(start, end));
        }
        Ok(Self { start, end })
    }

    /// The span `[start, start + width_secs)` expressed as a closed range.
    /// A zero width is treated as a single second.
    pub fn starting_at(start: i64, width_secs: i64) -> Self {
        let end = start.saturating_add(width_secs.max(1) - 1);
        Self { start, end }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts <= self.end
    }
}
