mod error;
mod event;
mod job_schedulers;
mod sender;
mod shared;
mod status;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use calendar_infra::CalendarContext;
pub use error::CalendarError;
pub use job_schedulers::Scheduler;
pub use sender::NotificationSender;
use std::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    event::configure_routes(cfg);
    status::configure_routes(cfg);
}

/// The rest api together with the scheduler and the notification sender.
/// They have to share the process when events are kept in memory.
pub struct Application {
    server: Server,
    port: u16,
    token: CancellationToken,
    job_schedulers: Vec<JoinHandle<()>>,
}

impl Application {
    pub async fn new(context: CalendarContext) -> anyhow::Result<Self> {
        let (server, port) = Application::configure_server(context.clone())?;
        let token = CancellationToken::new();
        let job_schedulers = Application::start_job_schedulers(context, token.clone()).await?;

        Ok(Self {
            server,
            port,
            token,
            job_schedulers,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    async fn start_job_schedulers(
        context: CalendarContext,
        token: CancellationToken,
    ) -> anyhow::Result<Vec<JoinHandle<()>>> {
        let scheduler = Scheduler::new(&context, context.create_producer().await?);
        let sender = NotificationSender::new(&context, context.create_consumer().await?);

        let scheduler_token = token.clone();
        let scheduler = tokio::spawn(async move { scheduler.run(scheduler_token).await });
        let sender = tokio::spawn(async move {
            if let Err(e) = sender.run(token).await {
                error!(error = %e, "The notification sender failed");
            }
        });

        Ok(vec![scheduler, sender])
    }

    fn configure_server(context: CalendarContext) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    /// Serves until the server is stopped, then stops the job schedulers
    pub async fn start(self) -> Result<(), std::io::Error> {
        info!("Listening on port: {}", self.port);
        let res = self.server.await;

        self.token.cancel();
        for handle in self.job_schedulers {
            if let Err(e) = handle.await {
                error!("A job scheduler failed: {:?}", e);
            }
        }
        res
    }
}
