use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::engine::{MapLayer, PlotFrame};
use crate::locator::GeoPoint;
use crate::series::ViewWindow;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

/// Contents of the time-limit box.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TimeLimitRequest {
    #[serde(default)]
    pub limit: String,
}

/// A range dragged on the plot; endpoints may come in either order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RangeRequest {
    pub t0: f64,
    pub t1: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CursorQuery {
    pub time: f64,
}

#[utoipa::path(
    put,
    path = "/api/window",
    tag = "plot",
    request_body = TimeLimitRequest,
    responses(
        (status = 200, description = "Window in effect", body = ViewWindow),
        (status = 400, description = "Unparseable time limit", body = ErrorResponse)
    )
)]
pub async fn set_time_limit(
    State(state): State<AppState>,
    Json(request): Json<TimeLimitRequest>,
) -> ApiResult<Json<ViewWindow>> {
    Ok(Json(state.session.engine().set_time_limit(&request.limit)?))
}

#[utoipa::path(
    put,
    path = "/api/window/range",
    tag = "plot",
    request_body = RangeRequest,
    responses(
        (status = 200, description = "Window in effect", body = ViewWindow),
        (status = 400, description = "Invalid range", body = ErrorResponse)
    )
)]
pub async fn set_range(
    State(state): State<AppState>,
    Json(request): Json<RangeRequest>,
) -> ApiResult<Json<ViewWindow>> {
    let window = ViewWindow::explicit(request.t0, request.t1)?;
    let engine = state.session.engine();
    engine.set_window(window)?;
    Ok(Json(engine.series().window()))
}

#[utoipa::path(
    get,
    path = "/api/plot",
    tag = "plot",
    responses(
        (status = 200, description = "Visible slice of every series", body = PlotFrame)
    )
)]
pub async fn plot_frame(State(state): State<AppState>) -> Json<PlotFrame> {
    Json(state.session.engine().plot_frame())
}

#[utoipa::path(
    get,
    path = "/api/cursor",
    tag = "map",
    params(
        ("time" = f64, Query, description = "Seconds since the Unix epoch")
    ),
    responses(
        (status = 200, description = "Vehicle position at that time", body = GeoPoint),
        (status = 400, description = "Time is not a finite number", body = ErrorResponse),
        (status = 503, description = "No origin or no positions yet", body = ErrorResponse)
    )
)]
pub async fn cursor(
    State(state): State<AppState>,
    Query(query): Query<CursorQuery>,
) -> ApiResult<Json<GeoPoint>> {
    Ok(Json(state.session.engine().cursor(query.time)?))
}

#[utoipa::path(
    get,
    path = "/api/layers",
    tag = "map",
    responses(
        (status = 200, description = "Map point layers", body = Vec<MapLayer>)
    )
)]
pub async fn layers(State(state): State<AppState>) -> Json<Vec<MapLayer>> {
    Json(state.layers.layers())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Origin;
    use crate::track::PositionSample;
    use crate::web::test_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn time_limit_and_drag_replace_each_other() {
        let state = test_state();
        let Json(window) = set_time_limit(
            State(state.clone()),
            Json(TimeLimitRequest { limit: "30".into() }),
        )
        .await
        .unwrap();
        assert_eq!(window, ViewWindow::Trailing { seconds: 30.0 });

        let Json(window) = set_range(State(state.clone()), Json(RangeRequest { t0: 200.0, t1: 100.0 }))
            .await
            .unwrap();
        assert_eq!(window, ViewWindow::Explicit { t0: 100.0, t1: 200.0 });

        let err = set_time_limit(State(state), Json(TimeLimitRequest { limit: "later".into() }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cursor_needs_origin_and_positions() {
        let state = test_state();
        let err = cursor(State(state.clone()), Query(CursorQuery { time: 1.0 }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let engine = state.session.engine();
        engine.handle_origin(Origin::new(42.0, -70.0)).unwrap();
        let err = cursor(State(state.clone()), Query(CursorQuery { time: 1.0 }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        engine
            .handle_position(PositionSample { time: 0.0, x: 0.0, y: 0.0 })
            .unwrap();
        let Json(point) = cursor(State(state.clone()), Query(CursorQuery { time: 5.0 }))
            .await
            .unwrap();
        assert_eq!(point.latitude, 42.0);
        assert_eq!(state.layers.cursor(), Some(point));

        let err = cursor(State(state.clone()), Query(CursorQuery { time: f64::NAN }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.layers.cursor(), Some(point));
    }

    #[tokio::test]
    async fn empty_plot_has_no_axis() {
        let state = test_state();
        let Json(frame) = plot_frame(State(state.clone())).await;
        assert!(frame.series.is_empty());
        assert!(frame.time_bounds.is_none());
        assert!(layers(State(state)).await.0.is_empty());
    }
}
