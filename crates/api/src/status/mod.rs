use actix_web::{web, HttpResponse};
use calendar_api_structs::get_service_health::*;

async fn status() -> HttpResponse {
    HttpResponse::Ok().json(APIResponse::new("Yo! We are up!\r\n"))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthcheck", web::get().to(status));
}
