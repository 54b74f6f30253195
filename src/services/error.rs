use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::roster_order::ReorderError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure taxonomy of the participation engine. Validation and state
/// conflicts are always raised before any write; `Database` covers storage
/// failures, including a penalty propagation aborted mid-walk (the ledger
/// increment stays committed in that case).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("event not found")]
    EventNotFound,
    #[error("member not found")]
    MemberNotFound,
    #[error("member already joined this event")]
    AlreadyJoined,
    #[error("member has not joined this event")]
    NotJoined,
    #[error("event registration is not open")]
    RegistrationClosed,
    #[error("event is not public")]
    EventNotPublic,
    #[error("event has already started")]
    EventStarted,
    #[error("event does not use binding registration")]
    NotBinding,
    #[error("all available spots are already confirmed")]
    FullyConfirmed,
    #[error("invalid reorder: {0}")]
    InvalidReorder(#[from] ReorderError),
    #[error("invalid event dates: {0}")]
    InvalidDates(String),
    #[error("update values cannot be empty")]
    EmptyUpdate,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // closed registration and unpublished events are privilege
            // problems, not bad requests
            Self::RegistrationClosed | Self::EventNotPublic => StatusCode::FORBIDDEN,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // never leak storage details to the caller
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, body).into_response()
    }
}
