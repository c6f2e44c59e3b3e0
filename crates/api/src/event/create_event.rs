use crate::error::CalendarError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use calendar_api_structs::create_event::*;
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

pub async fn create_event_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<CalendarContext>,
) -> Result<HttpResponse, CalendarError> {
    let body = body.0;
    let usecase = CreateEventUseCase {
        event: Event {
            id: body.id,
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
        .map(|event| HttpResponse::Created().json(APIResponse::new(event)))
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct CreateEventUseCase {
    pub event: Event,
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidDates(i64, i64),
    Storage(StorageError),
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateEventUseCase {
    type Response = Event;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateEvent";

    async fn execute(&mut self, ctx: &CalendarContext) -> Result<Self::Response, Self::Error> {
        if !self.event.has_valid_dates() {
            return Err(UseCaseError::InvalidDates(
                self.event.start_date,
                self.event.end_date,
            ));
        }

        ctx.repos
            .events
            .insert(&self.event)
            .await
            .map_err(UseCaseError::Storage)?;

        Ok(self.event.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use calendar_domain::TimeSpan;
    use calendar_infra::Config;

    fn event(id: &str) -> Event {
        Event {
            id: id.into(),
            title: "A".into(),
            start_date: 100,
            end_date: 200,
            owner_id: "user".into(),
            remind_in: 90,
            ..Default::default()
        }
    }

    #[actix_web::main]
    #[test]
    async fn creates_event() {
        let ctx = CalendarContext::create_inmemory(Config::new());
        let mut usecase = CreateEventUseCase { event: event("1") };

        let res = usecase.execute(&ctx).await;
        assert_eq!(res.unwrap(), event("1"));

        let stored = ctx
            .repos
            .events
            .find_by_start_date(&TimeSpan::new(50, 150).unwrap())
            .await
            .unwrap();
        assert_eq!(stored, vec![event("1")]);
    }

    #[actix_web::main]
    #[test]
    async fn rejects_duplicate_id() {
        let ctx = CalendarContext::create_inmemory(Config::new());
        let mut usecase = CreateEventUseCase { event: event("1") };
        assert!(usecase.execute(&ctx).await.is_ok());

        let res = usecase.execute(&ctx).await;
        assert!(matches!(
            res,
            Err(UseCaseError::Storage(StorageError::Conflict(_)))
        ));
    }

    #[actix_web::main]
    #[test]
    async fn rejects_event_ending_before_it_starts() {
        let ctx = CalendarContext::create_inmemory(Config::new());
        let mut usecase = CreateEventUseCase {
            event: Event {
                start_date: 300,
                end_date: 200,
                ..event("1")
            },
        };

        let res = usecase.execute(&ctx).await;
        assert!(matches!(res, Err(UseCaseError::InvalidDates(300, 200))));
    }
}
