use crate::error::CalendarError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use calendar_api_structs::update_event::*;
use calendar_domain::Event;
use calendar_infra::{CalendarContext, StorageError};

fn handle_error(e: UseCaseError) -> CalendarError {
    match e {
        UseCaseError::InvalidDates(start_date, end_date) => CalendarError::BadClientData(format!(
            "The event start date: {} can not be after its end date: {}.",
            start_date, end_date
        )),
        UseCaseError::Storage(e) => CalendarError::from_storage(e),
    }
}

pub async fn update_event_controller(
    body: web::Json<RequestBody>,
    path_params: web::Path<PathParams>,
    ctx: web::Data<CalendarContext>,
) -> Result<HttpResponse, CalendarError> {
    let body = body.0;
    let usecase = UpdateEventUseCase {
        event: Event {
            id: path_params.event_id.clone(),
            title: body.title,
            start_date: body.start_date,
            end_date: body.end_date,
            description: body.description,
            owner_id: body.owner_id,
            remind_in: body.remind_in,
        },
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Ok().json(APIResponse::new(event)))
        .map_err(handle_error)
}

/// Replaces the stored `Event` having the same id
#[derive(Debug)]
pub struct UpdateEventUseCase {
    pub event: Event,
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidDates(i64, i64),
    Storage(StorageError),
}

#[async_trait::async_trait(?Send)]
impl UseCase for UpdateEventUseCase {
    type Response = Event;

    type Error = UseCaseError;

    const NAME: &'static str = "UpdateEvent";

    async fn execute(&mut self, ctx: &CalendarContext) -> Result<Self::Response, Self::Error> {
        if !self.event.has_valid_dates() {
            return Err(UseCaseError::InvalidDates(
                self.event.start_date,
                self.event.end_date,
            ));
        }

        ctx.repos
            .events
            .save(&self.event)
            .await
            .map_err(UseCaseError::Storage)?;

        Ok(self.event.clone())
    }
}
