use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::EngineError;
use crate::locator::LocateError;
use crate::registry::RegistryError;
use crate::series::SeriesError;
use crate::transport::TransportError;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Conflict(&'static str, String),
    Unavailable(&'static str, String),
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let message = e.to_string();
        match e {
            EngineError::Registry(RegistryError::DuplicateField(_)) => {
                ApiError::Conflict("duplicate_field", message)
            }
            EngineError::Registry(RegistryError::UnknownField(_))
            | EngineError::Series(SeriesError::UnknownField(_)) => ApiError::NotFound(message),
            EngineError::Registry(RegistryError::InvalidField(_))
            | EngineError::Series(SeriesError::InvalidWindow(_)) => ApiError::Validation(message),
            EngineError::Locate(e) => e.into(),
            EngineError::Persistence(_) | EngineError::Snapshot(_) | EngineError::Spawn(_) => {
                ApiError::Internal(message)
            }
        }
    }
}

impl From<LocateError> for ApiError {
    fn from(e: LocateError) -> Self {
        let message = e.to_string();
        match e {
            LocateError::Uninitialized => ApiError::Unavailable("origin_not_set", message),
            LocateError::NotReady => ApiError::Unavailable("no_positions", message),
            LocateError::AlreadyInitialized => ApiError::Conflict("origin_already_set", message),
            LocateError::InvalidOrigin { .. } | LocateError::InvalidTime(_) => {
                ApiError::Validation(message)
            }
        }
    }
}

impl From<SeriesError> for ApiError {
    fn from(e: SeriesError) -> Self {
        EngineError::from(e).into()
    }
}

impl From<TransportError> for ApiError {
    fn from(e: TransportError) -> Self {
        ApiError::Unavailable("transport_error", e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(..) => StatusCode::CONFLICT,
            ApiError::Unavailable(..) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(msg) => ErrorResponse::with_message("validation_failed", &msg),
            ApiError::NotFound(msg) => ErrorResponse::with_message("not_found", &msg),
            ApiError::Conflict(reason, msg) | ApiError::Unavailable(reason, msg) => {
                ErrorResponse::with_message(reason, &msg)
            }
            ApiError::Internal(msg) => ErrorResponse::with_message("internal_error", &msg),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
