use calendar_domain::{Event, EventNotification, TimeSpan};
use calendar_infra::{CalendarContext, IEventRepo, IMQProducer, ISys, MQError, StorageError};
use chrono::{Months, TimeZone, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const SECS_PER_YEAR: i64 = 365 * 24 * 60 * 60;

/// Start of the retention window: the same instant one calendar year ago
pub fn retention_start(now: i64) -> i64 {
    Utc.timestamp_opt(now, 0)
        .single()
        .and_then(|now| now.checked_sub_months(Months::new(12)))
        .map(|year_ago| year_ago.timestamp())
        .unwrap_or_else(|| now.saturating_sub(SECS_PER_YEAR))
}

fn storage_timeout(after: Duration) -> StorageError {
    StorageError::Backend(anyhow::anyhow!("The storage call timed out after {:?}", after))
}

fn mq_timeout(after: Duration) -> MQError {
    MQError::Backend(format!("The broker call timed out after {:?}", after))
}

/// Runs `cycle` every `period` until the token is cancelled. The first
/// cycle runs one `period` after start.
async fn every<F, Fut>(period: Duration, token: CancellationToken, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => cycle().await,
        }
    }
}

/// Finds the events that are due for a reminder and publishes their
/// notifications, and removes the events that have passed the retention window.
///
/// Both cycles share the interval but tick independently. The `Scheduler`
/// keeps no state of its own so that a cycle can run at the same time as the
/// other cycle and the api.
pub struct Scheduler {
    events: Arc<dyn IEventRepo>,
    producer: Arc<dyn IMQProducer>,
    sys: Arc<dyn ISys>,
    interval: Duration,
    operation_timeout: Duration,
}

impl Scheduler {
    pub fn new(ctx: &CalendarContext, producer: Arc<dyn IMQProducer>) -> Self {
        Self {
            events: ctx.repos.events.clone(),
            producer,
            sys: ctx.sys.clone(),
            interval: ctx.config.scheduler_interval,
            operation_timeout: ctx.config.operation_timeout,
        }
    }

    /// Runs both cycles until the token is cancelled. Consumes the
    /// `Scheduler`, so a stopped `Scheduler` can not be started again.
    pub async fn run(self, token: CancellationToken) {
        info!(interval = ?self.interval, "Scheduler started");
        let scheduler = Arc::new(self);

        let dispatcher = {
            let scheduler = scheduler.clone();
            tokio::spawn(every(scheduler.interval, token.clone(), move || {
                let scheduler = scheduler.clone();
                async move { scheduler.dispatch_reminders().await }
            }))
        };
        let cleaner = {
            let scheduler = scheduler.clone();
            tokio::spawn(every(scheduler.interval, token.clone(), move || {
                let scheduler = scheduler.clone();
                async move { scheduler.cleanup_expired_events().await }
            }))
        };

        let (dispatched, cleaned) = tokio::join!(dispatcher, cleaner);
        if let Err(e) = dispatched {
            error!("The reminder dispatch worker failed: {:?}", e);
        }
        if let Err(e) = cleaned {
            error!("The event cleanup worker failed: {:?}", e);
        }

        if let Err(e) = scheduler.producer.close_connection().await {
            warn!(error = %e, "Unable to close the broker connection");
        }
        info!("Scheduler stopped");
    }

    fn interval_secs(&self) -> i64 {
        i64::try_from(self.interval.as_secs()).unwrap_or(i64::MAX)
    }

    async fn bounded<T, E>(
        &self,
        op: impl Future<Output = Result<T, E>>,
        timed_out: fn(Duration) -> E,
    ) -> Result<T, E> {
        match timeout(self.operation_timeout, op).await {
            Ok(res) => res,
            Err(_) => Err(timed_out(self.operation_timeout)),
        }
    }

    /// Publishes a notification for every event with a reminder in
    /// `[now, now + interval)`.
    pub async fn dispatch_reminders(&self) {
        let window = TimeSpan::starting_at(self.sys.get_timestamp(), self.interval_secs());
        let events = match self
            .bounded(self.events.find_by_remind_in(&window), storage_timeout)
            .await
        {
            Ok(events) => events,
            Err(StorageError::Empty) => {
                debug!(from = window.start(), to = window.end(), "No reminders are due");
                return;
            }
            Err(e) => {
                error!(error = %e, "Unable to query the events due for a reminder");
                return;
            }
        };

        if let Err(e) = self.bounded(self.producer.open_channel(), mq_timeout).await {
            error!(error = %e, "Unable to open the notification channel");
            return;
        }
        for event in &events {
            if let Err(e) = self.publish(event).await {
                error!(event_id = %event.id, error = %e, "Unable to publish the event notification");
            }
        }
        if let Err(e) = self.bounded(self.producer.close_channel(), mq_timeout).await {
            warn!(error = %e, "Unable to close the notification channel");
        }
        info!(count = events.len() as i64, "Reminder dispatch finished");
    }

    async fn publish(&self, event: &Event) -> Result<(), MQError> {
        let payload = EventNotification::from(event)
            .to_bytes()
            .map_err(|e| MQError::Publish(e.to_string()))?;
        self.bounded(self.producer.publish(payload), mq_timeout)
            .await
    }

    /// Removes every event starting in `[year_ago, year_ago + interval)`
    pub async fn cleanup_expired_events(&self) {
        let year_ago = retention_start(self.sys.get_timestamp());
        let window = TimeSpan::starting_at(year_ago, self.interval_secs());
        let events = match self
            .bounded(self.events.find_by_start_date(&window), storage_timeout)
            .await
        {
            Ok(events) => events,
            Err(StorageError::Empty) => {
                debug!(from = window.start(), to = window.end(), "No events have expired");
                return;
            }
            Err(e) => {
                error!(error = %e, "Unable to query the expired events");
                return;
            }
        };

        for event in &events {
            match self
                .bounded(self.events.delete(&event.id), storage_timeout)
                .await
            {
                Ok(()) => {}
                // Removed through the api since the query
                Err(StorageError::NotFound(_)) => {
                    debug!(event_id = %event.id, "Expired event was already removed")
                }
                Err(e) => error!(event_id = %event.id, error = %e, "Unable to remove the expired event"),
            }
        }
        info!(count = events.len() as i64, "Event cleanup finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calendar_infra::Config;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const NOW: i64 = 1_700_000_000;
    const INTERVAL: i64 = 60;

    struct StaticTimeSys {}
    impl ISys for StaticTimeSys {
        fn get_timestamp(&self) -> i64 {
            NOW
        }
    }

    #[derive(Default)]
    struct MockProducer {
        attempts: Mutex<Vec<String>>,
        published: Mutex<Vec<EventNotification>>,
        fail_for: Option<String>,
        hang_for: Option<String>,
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    impl MockProducer {
        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }

        fn published(&self) -> Vec<String> {
            self.published
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.event_id.clone())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl IMQProducer for MockProducer {
        async fn open_channel(&self) -> Result<(), MQError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn publish(&self, payload: Vec<u8>) -> Result<(), MQError> {
            let n = EventNotification::from_bytes(&payload)?;
            self.attempts.lock().unwrap().push(n.event_id.clone());
            if self.fail_for.as_ref() == Some(&n.event_id) {
                return Err(MQError::Publish("broker unavailable".into()));
            }
            if self.hang_for.as_ref() == Some(&n.event_id) {
                futures::future::pending::<()>().await;
            }
            self.published.lock().unwrap().push(n);
            Ok(())
        }

        async fn close_channel(&self) -> Result<(), MQError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close_connection(&self) -> Result<(), MQError> {
            Ok(())
        }
    }

    /// Event repo that fails the chosen calls and delegates the rest
    struct FlakyEventRepo {
        inner: Arc<dyn IEventRepo>,
        fail_delete_for: Option<String>,
        fail_queries: bool,
    }

    impl FlakyEventRepo {
        fn unavailable() -> StorageError {
            StorageError::Backend(anyhow::anyhow!("database unavailable"))
        }
    }

    #[async_trait::async_trait]
    impl IEventRepo for FlakyEventRepo {
        async fn insert(&self, e: &Event) -> Result<(), StorageError> {
            self.inner.insert(e).await
        }

        async fn save(&self, e: &Event) -> Result<(), StorageError> {
            self.inner.save(e).await
        }

        async fn delete(&self, event_id: &str) -> Result<(), StorageError> {
            if self.fail_delete_for.as_deref() == Some(event_id) {
                return Err(Self::unavailable());
            }
            self.inner.delete(event_id).await
        }

        async fn find_by_start_date(&self, span: &TimeSpan) -> Result<Vec<Event>, StorageError> {
            if self.fail_queries {
                return Err(Self::unavailable());
            }
            self.inner.find_by_start_date(span).await
        }

        async fn find_by_remind_in(&self, span: &TimeSpan) -> Result<Vec<Event>, StorageError> {
            if self.fail_queries {
                return Err(Self::unavailable());
            }
            self.inner.find_by_remind_in(span).await
        }
    }

    fn setup_context() -> CalendarContext {
        let mut ctx = CalendarContext::create_inmemory(Config::new());
        ctx.sys = Arc::new(StaticTimeSys {});
        ctx.config.scheduler_interval = Duration::from_secs(INTERVAL as u64);
        ctx.config.operation_timeout = Duration::from_millis(200);
        ctx
    }

    fn event(id: &str, start_date: i64, remind_in: i64) -> Event {
        Event {
            id: id.into(),
            title: format!("Event {}", id),
            start_date,
            end_date: start_date + 100,
            owner_id: "user".into(),
            remind_in,
            ..Default::default()
        }
    }

    async fn insert_all(ctx: &CalendarContext, events: &[Event]) {
        for e in events {
            ctx.repos.events.insert(e).await.unwrap();
        }
    }

    #[actix_web::main]
    #[test]
    async fn dispatches_only_reminders_inside_the_window() {
        let ctx = setup_context();
        insert_all(
            &ctx,
            &[
                event("before", NOW + 1000, NOW - 1),
                event("start", NOW + 1000, NOW),
                event("middle", NOW + 1000, NOW + INTERVAL / 2),
                event("last", NOW + 1000, NOW + INTERVAL - 1),
                event("end", NOW + 1000, NOW + INTERVAL),
                event("after", NOW + 1000, NOW + INTERVAL + 1),
            ],
        )
        .await;
        let producer = Arc::new(MockProducer::default());
        let scheduler = Scheduler::new(&ctx, producer.clone());

        scheduler.dispatch_reminders().await;

        assert_eq!(producer.published(), vec!["start", "middle", "last"]);
        assert_eq!(producer.opened.load(Ordering::SeqCst), 1);
        assert_eq!(producer.closed.load(Ordering::SeqCst), 1);
    }

    #[actix_web::main]
    #[test]
    async fn publishes_the_event_fields() {
        let ctx = setup_context();
        let e = event("1", NOW + 1000, NOW + 1);
        insert_all(&ctx, &[e.clone()]).await;
        let producer = Arc::new(MockProducer::default());

        Scheduler::new(&ctx, producer.clone())
            .dispatch_reminders()
            .await;

        let published = producer.published.lock().unwrap().clone();
        assert_eq!(published, vec![EventNotification::from(&e)]);
        assert_eq!(published[0].date, NOW + 1000);
        assert_eq!(published[0].user_id, "user");
    }

    #[actix_web::main]
    #[test]
    async fn publish_failure_does_not_abort_the_batch() {
        let ctx = setup_context();
        insert_all(
            &ctx,
            &[event("A", NOW + 1000, NOW + 1), event("B", NOW + 1000, NOW + 2)],
        )
        .await;
        let producer = Arc::new(MockProducer {
            fail_for: Some("A".into()),
            ..Default::default()
        });

        Scheduler::new(&ctx, producer.clone())
            .dispatch_reminders()
            .await;

        assert_eq!(producer.attempts(), vec!["A", "B"]);
        assert_eq!(producer.published(), vec!["B"]);
        assert_eq!(producer.closed.load(Ordering::SeqCst), 1);
    }

    #[actix_web::main]
    #[test]
    async fn publish_timeout_does_not_abort_the_batch() {
        let ctx = setup_context();
        insert_all(
            &ctx,
            &[event("A", NOW + 1000, NOW + 1), event("B", NOW + 1000, NOW + 2)],
        )
        .await;
        let producer = Arc::new(MockProducer {
            hang_for: Some("A".into()),
            ..Default::default()
        });

        Scheduler::new(&ctx, producer.clone())
            .dispatch_reminders()
            .await;

        assert_eq!(producer.attempts(), vec!["A", "B"]);
        assert_eq!(producer.published(), vec!["B"]);
    }

    #[actix_web::main]
    #[test]
    async fn does_not_open_channel_without_due_reminders() {
        let ctx = setup_context();
        insert_all(&ctx, &[event("later", NOW + 1000, NOW + 10 * INTERVAL)]).await;
        let producer = Arc::new(MockProducer::default());

        Scheduler::new(&ctx, producer.clone())
            .dispatch_reminders()
            .await;

        assert!(producer.attempts().is_empty());
        assert_eq!(producer.opened.load(Ordering::SeqCst), 0);
    }

    #[actix_web::main]
    #[test]
    async fn removes_only_events_inside_the_retention_window() {
        let ctx = setup_context();
        let year_ago = retention_start(NOW);
        insert_all(
            &ctx,
            &[
                event("before", year_ago - 1, 0),
                event("middle", year_ago + INTERVAL / 2, 0),
                event("after", year_ago + INTERVAL + 1, 0),
            ],
        )
        .await;
        let scheduler = Scheduler::new(&ctx, Arc::new(MockProducer::default()));

        scheduler.cleanup_expired_events().await;

        let remaining: Vec<String> = ctx
            .repos
            .events
            .find_by_start_date(&TimeSpan::new(year_ago - 10, year_ago + 10 * INTERVAL).unwrap())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(remaining, vec!["before", "after"]);
    }

    #[actix_web::main]
    #[test]
    async fn removal_failure_does_not_abort_the_cleanup() {
        let mut ctx = setup_context();
        let year_ago = retention_start(NOW);
        insert_all(
            &ctx,
            &[
                event("A", year_ago, 0),
                event("B", year_ago + 1, 0),
                event("C", year_ago + 2, 0),
            ],
        )
        .await;
        let stored = ctx.repos.events.clone();
        ctx.repos.events = Arc::new(FlakyEventRepo {
            inner: stored.clone(),
            fail_delete_for: Some("B".into()),
            fail_queries: false,
        });
        let scheduler = Scheduler::new(&ctx, Arc::new(MockProducer::default()));

        scheduler.cleanup_expired_events().await;

        let remaining: Vec<String> = stored
            .find_by_start_date(&TimeSpan::new(year_ago, year_ago + INTERVAL).unwrap())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(remaining, vec!["B"]);
    }

    #[actix_web::main]
    #[test]
    async fn query_failure_skips_the_cycle() {
        let mut ctx = setup_context();
        insert_all(&ctx, &[event("due", NOW + 1000, NOW + 1)]).await;
        let stored = ctx.repos.events.clone();
        ctx.repos.events = Arc::new(FlakyEventRepo {
            inner: stored.clone(),
            fail_delete_for: None,
            fail_queries: true,
        });
        let producer = Arc::new(MockProducer::default());
        let scheduler = Scheduler::new(&ctx, producer.clone());

        scheduler.dispatch_reminders().await;
        scheduler.cleanup_expired_events().await;

        assert!(producer.attempts().is_empty());
        assert_eq!(producer.opened.load(Ordering::SeqCst), 0);
        let due = stored
            .find_by_remind_in(&TimeSpan::new(NOW, NOW + INTERVAL).unwrap())
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn retention_starts_one_calendar_year_ago() {
        // 2024-03-01T00:00:00Z
        let now = 1_709_251_200;
        // 2023-03-01T00:00:00Z
        assert_eq!(retention_start(now), 1_677_628_800);
        assert_eq!(retention_start(i64::MIN), i64::MIN);
    }

    #[actix_web::main]
    #[test]
    async fn stops_both_workers_on_cancellation() {
        let ctx = setup_context();
        let scheduler = Scheduler::new(&ctx, Arc::new(MockProducer::default()));
        let token = CancellationToken::new();

        let handle = tokio::spawn(scheduler.run(token.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let res = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(res, Ok(Ok(()))));
    }
}
