use calendar_api::Application;
use calendar_infra::{CalendarContext, Config};
use std::time::Duration;

pub struct TestApp {
    pub address: String,
    pub context: CalendarContext,
}

// Launch the application as a background task
pub async fn spawn_app() -> TestApp {
    let mut config = Config::new();
    config.port = 0; // Random port
    config.nats.url = "memory://".into();
    config.scheduler_interval = Duration::from_secs(2);
    let context = CalendarContext::create_inmemory(config);

    let application = Application::new(context.clone())
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}/api/v1", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    TestApp { address, context }
}
