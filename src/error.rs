use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::state_machine::InvalidTransition};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Player, progress, collection record or interactive object is missing.
    #[error("not found: {0}")]
    NotFound(String),
    /// Action is not allowed given the player's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Completion attempted before its requirements are met.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// A collaborator outside the engine (mail relay, background write) failed.
    #[error("downstream failure: {0}")]
    Downstream(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with the player's current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Request understood but its preconditions are not met.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PreconditionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "INVALID_STATE",
            AppError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::PreconditionFailed(message) => AppError::PreconditionFailed(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Downstream(message) => AppError::Internal(message),
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable error code.
    pub code: String,
    /// Human readable description.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            code: self.code().to_owned(),
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{stage::GameStage, state_machine::QuestEvent};

    #[test]
    fn service_errors_map_to_wire_codes() {
        let cases = [
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (ServiceError::InvalidState("x".into()), StatusCode::CONFLICT, "INVALID_STATE"),
            (
                ServiceError::PreconditionFailed("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "PRECONDITION_FAILED",
            ),
            (ServiceError::InvalidInput("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (ServiceError::Degraded, StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            (ServiceError::Downstream("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        ];

        for (service_error, status, code) in cases {
            let app_error = AppError::from(service_error);
            assert_eq!(app_error.status(), status);
            assert_eq!(app_error.code(), code);
        }
    }

    #[test]
    fn invalid_transition_is_an_invalid_state() {
        let err: ServiceError = InvalidTransition {
            from: GameStage::GameComplete,
            event: QuestEvent::StartGame,
        }
        .into();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
