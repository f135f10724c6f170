use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub channel: String,
    #[schema(value_type = Object)]
    pub payload: Value,
}

/// Inject a message onto the in-process bus, as if the vehicle had sent it.
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "messages",
    request_body = PublishRequest,
    responses(
        (status = 202, description = "Message queued for delivery"),
        (status = 503, description = "No in-process bus", body = ErrorResponse)
    )
)]
pub async fn publish(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> ApiResult<StatusCode> {
    let publisher = state.publisher.as_ref().ok_or_else(|| {
        ApiError::Unavailable("no_bus", "session is not running on an in-process bus".into())
    })?;
    publisher.publish(&request.channel, request.payload.to_string().into_bytes())?;
    Ok(StatusCode::ACCEPTED)
}
