use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Settings for the message broker the notifications are published to.
/// The names follow the broker: a `stream` is where published messages
/// are kept and the `subject` is used for routing into it.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// Address of the broker. `memory://` selects the in-process broker
    pub url: String,
    pub stream: String,
    pub subject: String,
    /// Durable consumer name used by the notification sender
    pub consumer: String,
    /// How many times an unacknowledged notification is delivered before the
    /// broker gives up on it. Malformed payloads are never acknowledged so this
    /// bounds how long they keep coming back.
    pub max_deliver: i64,
}

impl NatsConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("memory://")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Postgres connection string. The in-memory repositories are used
    /// when this is not set.
    pub database_url: Option<String>,
    /// How often the scheduler looks for due reminders and expired events.
    /// This is also the width of the reminder and retention windows.
    pub scheduler_interval: Duration,
    /// Upper bound for every storage and broker call made by the scheduler
    pub operation_timeout: Duration,
    pub nats: NatsConfig,
}

fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    name, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn new() -> Self {
        let port = env_or_default("PORT", 5000usize);

        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Some(url),
            _ => {
                info!("Did not find DATABASE_URL environment variable. Events will be kept in memory.");
                None
            }
        };

        let mut interval_secs = env_or_default("SCHEDULER_INTERVAL_SECS", 60u64);
        if interval_secs == 0 {
            warn!("SCHEDULER_INTERVAL_SECS must be at least 1 second, using 1 second.");
            interval_secs = 1;
        }
        let timeout_secs = env_or_default("OPERATION_TIMEOUT_SECS", 10u64).max(1);

        let nats = NatsConfig {
            url: env_or_default("NATS_URL", "nats://localhost:4222".to_string()),
            stream: env_or_default("NATS_STREAM", "CALENDAR_NOTIFICATIONS".to_string()),
            subject: env_or_default("NATS_SUBJECT", "calendar.notifications".to_string()),
            consumer: env_or_default("NATS_CONSUMER", "calendar-sender".to_string()),
            max_deliver: env_or_default("NATS_MAX_DELIVER", 5i64),
        };

        Self {
            port,
            database_url,
            scheduler_interval: Duration::from_secs(interval_secs),
            operation_timeout: Duration::from_secs(timeout_secs),
            nats,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn falls_back_to_defaults_on_invalid_values() {
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("SCHEDULER_INTERVAL_SECS", "0");
        let config = Config::new();
        std::env::remove_var("PORT");
        std::env::remove_var("SCHEDULER_INTERVAL_SECS");

        assert_eq!(config.port, 5000);
        assert_eq!(config.scheduler_interval, Duration::from_secs(1));
    }

    #[test]
    #[serial]
    fn reads_broker_settings() {
        std::env::set_var("NATS_URL", "memory://");
        std::env::set_var("NATS_MAX_DELIVER", "3");
        let config = Config::new();
        std::env::remove_var("NATS_URL");
        std::env::remove_var("NATS_MAX_DELIVER");

        assert!(config.nats.is_in_memory());
        assert_eq!(config.nats.max_deliver, 3);
        assert_eq!(config.nats.subject, "calendar.notifications");
    }
}
