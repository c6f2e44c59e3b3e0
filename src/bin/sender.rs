use calendar::telemetry::{get_subscriber, init_subscriber};
use calendar_api::NotificationSender;
use calendar_infra::setup_context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Records the received event notifications until Ctrl-C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("calendar_sender".into(), "info".into());
    init_subscriber(subscriber)?;

    let context = setup_context().await?;
    if context.config.nats.is_in_memory() {
        anyhow::bail!("The sender needs a NATS_URL, the inmemory broker only works inside the calendar server");
    }
    let consumer = context.create_consumer().await?;
    let sender = NotificationSender::new(&context, consumer);

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, stopping the sender"),
            Err(e) => error!("Unable to listen for Ctrl-C: {:?}", e),
        }
        shutdown.cancel();
    });

    sender.run(token).await?;
    Ok(())
}
