use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::registry::{Field, FieldSpec};
use crate::series::{parse_bound, SeriesView, YRange};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct FieldQuery {
    pub key: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FieldKeyRequest {
    pub key: String,
}

/// Y-limit entries as typed; blank or non-numeric text clears the bound.
#[derive(Debug, Deserialize, ToSchema)]
pub struct YLimitRequest {
    pub key: String,
    #[serde(default)]
    pub ymin: Option<String>,
    #[serde(default)]
    pub ymax: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VisibilityRequest {
    pub key: String,
    pub visible: bool,
}

#[utoipa::path(
    get,
    path = "/api/fields",
    tag = "fields",
    responses(
        (status = 200, description = "Registered fields", body = Vec<Field>)
    )
)]
pub async fn list_fields(State(state): State<AppState>) -> Json<Vec<Field>> {
    Json(state.session.engine().fields())
}

#[utoipa::path(
    post,
    path = "/api/fields",
    tag = "fields",
    request_body = FieldSpec,
    responses(
        (status = 201, description = "Field registered and subscribed", body = Field),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 409, description = "Field already registered", body = ErrorResponse)
    )
)]
pub async fn add_field(
    State(state): State<AppState>,
    Json(spec): Json<FieldSpec>,
) -> ApiResult<(StatusCode, Json<Field>)> {
    let field = state.session.add_field(spec)?;
    Ok((StatusCode::CREATED, Json(field)))
}

#[utoipa::path(
    delete,
    path = "/api/fields",
    tag = "fields",
    params(
        ("key" = String, Query, description = "Field key, `channel/field`")
    ),
    responses(
        (status = 200, description = "Field removed", body = Field),
        (status = 404, description = "Unknown field", body = ErrorResponse)
    )
)]
pub async fn remove_field(
    State(state): State<AppState>,
    Query(query): Query<FieldQuery>,
) -> ApiResult<Json<Field>> {
    Ok(Json(state.session.remove_field(&query.key)?))
}

#[utoipa::path(
    post,
    path = "/api/fields/clear",
    tag = "fields",
    request_body = FieldKeyRequest,
    responses(
        (status = 204, description = "History cleared"),
        (status = 404, description = "Unknown field", body = ErrorResponse)
    )
)]
pub async fn clear_field(
    State(state): State<AppState>,
    Json(request): Json<FieldKeyRequest>,
) -> ApiResult<StatusCode> {
    state.session.clear_field(&request.key)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/fields/ylim",
    tag = "fields",
    request_body = YLimitRequest,
    responses(
        (status = 200, description = "Updated series", body = SeriesView),
        (status = 404, description = "Unknown field", body = ErrorResponse)
    )
)]
pub async fn set_y_limits(
    State(state): State<AppState>,
    Json(request): Json<YLimitRequest>,
) -> ApiResult<Json<SeriesView>> {
    let bound = |text: &Option<String>| text.as_deref().and_then(parse_bound);
    let y_range = YRange::new(bound(&request.ymin), bound(&request.ymax));

    let engine = state.session.engine();
    engine.set_y_range(&request.key, y_range)?;
    Ok(Json(engine.series().view(&request.key)?))
}

#[utoipa::path(
    put,
    path = "/api/fields/visibility",
    tag = "fields",
    request_body = VisibilityRequest,
    responses(
        (status = 200, description = "Updated series", body = SeriesView),
        (status = 404, description = "Unknown field", body = ErrorResponse)
    )
)]
pub async fn set_visibility(
    State(state): State<AppState>,
    Json(request): Json<VisibilityRequest>,
) -> ApiResult<Json<SeriesView>> {
    let engine = state.session.engine();
    engine.set_visible(&request.key, request.visible)?;
    Ok(Json(engine.series().view(&request.key)?))
}
