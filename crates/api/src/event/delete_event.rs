use crate::error::CalendarError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use calendar_api_structs::delete_event::*;
use calendar_infra::{CalendarContext, StorageError};

pub async fn delete_event_controller(
    path_params: web::Path<PathParams>,
    ctx: web::Data<CalendarContext>,
) -> Result<HttpResponse, CalendarError> {
    let usecase = DeleteEventUseCase {
        event_id: path_params.event_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|event_id| HttpResponse::Ok().json(APIResponse { event_id }))
        .map_err(CalendarError::from_storage)
}

#[derive(Debug)]
pub struct DeleteEventUseCase {
    pub event_id: String,
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteEventUseCase {
    type Response = String;

    type Error = StorageError;

    const NAME: &'static str = "DeleteEvent";

    async fn execute(&mut self, ctx: &CalendarContext) -> Result<Self::Response, Self::Error> {
        ctx.repos.events.delete(&self.event_id).await?;
        Ok(self.event_id.clone())
    }
}
