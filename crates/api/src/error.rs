use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::{DoorPassError, InviteError, RoleAssignmentError, StoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A presented invite, code or pass cannot be used.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::InvalidToken(msg) => (StatusCode::BAD_REQUEST, "invalid_token", msg.clone()),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => ApiError::Conflict("Resource already exists".into()),
            StoreError::Backend(msg) => ApiError::Internal(format!("Storage error: {}", msg)),
        }
    }
}

impl From<InviteError> for ApiError {
    fn from(err: InviteError) -> Self {
        match err {
            InviteError::NotFound => ApiError::NotFound("Invite not found".into()),
            InviteError::EventNotFound => ApiError::NotFound("Event not found".into()),
            InviteError::Forbidden(msg) => ApiError::Forbidden(msg),
            InviteError::InvalidMetadata(_) => ApiError::Validation(err.to_string()),
            InviteError::AlreadyUsed | InviteError::Expired | InviteError::CapacityExceeded => {
                ApiError::InvalidToken(err.to_string())
            }
            InviteError::Store(e) => e.into(),
        }
    }
}

impl From<RoleAssignmentError> for ApiError {
    fn from(err: RoleAssignmentError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<DoorPassError> for ApiError {
    fn from(err: DoorPassError) -> Self {
        match err {
            DoorPassError::NotFound => ApiError::NotFound("Registration not found".into()),
            DoorPassError::Forbidden(msg) => ApiError::Forbidden(msg),
            // One message for every codec failure; the reason is only logged.
            DoorPassError::InvalidPass(_) => ApiError::InvalidToken("Invalid pass".into()),
            DoorPassError::WrongEvent => {
                ApiError::InvalidToken("Pass is not valid for this event".into())
            }
            DoorPassError::AlreadyCheckedIn => {
                ApiError::Conflict("Registration has already been checked in".into())
            }
            DoorPassError::Store(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();

        let message = if messages.len() == 1 {
            messages[0].clone()
        } else {
            format!("{} validation errors", messages.len())
        };

        ApiError::Validation(message)
    }
}
