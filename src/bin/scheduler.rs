use calendar::telemetry::{get_subscriber, init_subscriber};
use calendar_api::Scheduler;
use calendar_infra::setup_context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Dispatches reminders and removes expired events until Ctrl-C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("calendar_scheduler".into(), "info".into());
    init_subscriber(subscriber)?;

    let context = setup_context().await?;
    if context.config.nats.is_in_memory() {
        anyhow::bail!("The scheduler needs a NATS_URL, the inmemory broker only works inside the calendar server");
    }
    if context.config.database_url.is_none() {
        warn!("The scheduler only sees its own inmemory events without a DATABASE_URL");
    }
    let producer = context.create_producer().await?;
    let scheduler = Scheduler::new(&context, producer);

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, stopping the scheduler"),
            Err(e) => error!("Unable to listen for Ctrl-C: {:?}", e),
        }
        shutdown.cancel();
    });

    scheduler.run(token).await;
    Ok(())
}
