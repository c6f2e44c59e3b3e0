use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};
use calendar_infra::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Internal server error")]
    InternalError,
    #[error("Invalid data provided: Error message: `{0}`")]
    BadClientData(String),
    #[error("404 Not found. Error message: `{0}`")]
    NotFound(String),
}

impl CalendarError {
    /// Translation used by every controller that surfaces a `StorageError`.
    /// A duplicate id is a client mistake and an empty query a missing resource.
    pub fn from_storage(e: StorageError) -> Self {
        match e {
            StorageError::Conflict(id) => {
                Self::BadClientData(format!("An event with id: {}, already exists.", id))
            }
            StorageError::NotFound(id) => {
                Self::NotFound(format!("The event with id: {}, was not found.", id))
            }
            StorageError::Empty => Self::NotFound("No events were found in the given range.".into()),
            StorageError::Backend(_) => Self::InternalError,
        }
    }
}

impl actix_web::error::ResponseError for CalendarError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadClientData(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
            .body(self.to_string())
    }
}
