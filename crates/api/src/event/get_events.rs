use crate::error::CalendarError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use calendar_api_structs::get_events::*;
use calendar_domain::{Event, InvalidTimeSpanError, TimeSpan};
use calendar_infra::{CalendarContext, StorageError};

fn handle_error(e: UseCaseError) -> CalendarError {
    match e {
        UseCaseError::InvalidTimeSpan(e) => CalendarError::BadClientData(e.to_string()),
        UseCaseError::Storage(e) => CalendarError::from_storage(e),
    }
}

pub async fn get_events_controller(
    query_params: web::Query<QueryParams>,
    ctx: web::Data<CalendarContext>,
) -> Result<HttpResponse, CalendarError> {
    let usecase = GetEventsUseCase {
        from: query_params.from,
        to: query_params.to,
    };

    execute(usecase, &ctx)
        .await
        .map(|events| HttpResponse::Ok().json(APIResponse::new(events)))
        .map_err(handle_error)
}

/// Lists the `Event`s starting between `from` and `to`, both included
#[derive(Debug)]
pub struct GetEventsUseCase {
    pub from: i64,
    pub to: i64,
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidTimeSpan(InvalidTimeSpanError),
    Storage(StorageError),
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetEventsUseCase {
    type Response = Vec<Event>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetEvents";

    async fn execute(&mut self, ctx: &CalendarContext) -> Result<Self::Response, Self::Error> {
        let span = TimeSpan::new(self.from, self.to).map_err(UseCaseError::InvalidTimeSpan)?;
        ctx.repos
            .events
            .find_by_start_date(&span)
            .await
            .map_err(UseCaseError::Storage)
    }
}
