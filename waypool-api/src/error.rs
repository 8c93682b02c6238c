use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use waypool_ride::RideError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Validation(String),
    Conflict(String),
    Forbidden(String),
    Internal(String),
}

impl From<RideError> for AppError {
    fn from(err: RideError) -> Self {
        let message = err.to_string();
        match err {
            RideError::RideNotFound(_) | RideError::TravelerNotFound(_) => {
                AppError::NotFound(message)
            }
            RideError::InvalidSegment | RideError::InvalidCapacity => AppError::Validation(message),
            RideError::WrongRideType { .. }
            | RideError::GenderRestricted
            | RideError::RideFull
            | RideError::OwnRide
            | RideError::AlreadyJoined
            | RideError::AlreadyAccepted
            | RideError::Contention(_) => AppError::Conflict(message),
            RideError::NotOwner => AppError::Forbidden(message),
            RideError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
