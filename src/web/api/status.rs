use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::EngineStatus;
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Whether the delivery thread is pumping messages.
    pub delivering: bool,
    pub subscriptions: usize,
    #[serde(flatten)]
    pub engine: EngineStatus,
}

#[utoipa::path(
    get,
    path = "/api/status",
    tag = "status",
    responses(
        (status = 200, description = "Origin, track and subscription state", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let session = &state.session;
    Json(StatusResponse {
        delivering: session.is_running(),
        subscriptions: session.subscription_count(),
        engine: session.engine().status(),
    })
}
