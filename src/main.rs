use calendar::telemetry::{get_subscriber, init_subscriber};
use calendar_api::Application;
use calendar_infra::setup_context;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("calendar_server".into(), "info".into());
    init_subscriber(subscriber)?;

    let context = setup_context().await?;

    let app = Application::new(context).await?;
    app.start().await?;
    Ok(())
}
