mod event;
mod notification;
mod timespan;

pub use event::Event;
pub use notification::EventNotification;
pub use timespan::{InvalidTimeSpanError, TimeSpan};
