use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::fields::{FieldKeyRequest, VisibilityRequest, YLimitRequest};
use super::api::messages::PublishRequest;
use super::api::plot::{RangeRequest, TimeLimitRequest};
use super::api::status::StatusResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::status::status,
        super::api::fields::list_fields,
        super::api::fields::add_field,
        super::api::fields::remove_field,
        super::api::fields::clear_field,
        super::api::fields::set_y_limits,
        super::api::fields::set_visibility,
        super::api::plot::set_time_limit,
        super::api::plot::set_range,
        super::api::plot::plot_frame,
        super::api::plot::cursor,
        super::api::plot::layers,
        super::api::messages::publish,
    ),
    components(
        schemas(
            ErrorResponse,
            StatusResponse,
            FieldKeyRequest,
            YLimitRequest,
            VisibilityRequest,
            TimeLimitRequest,
            RangeRequest,
            PublishRequest,
            crate::engine::EngineStatus,
            crate::engine::PlotFrame,
            crate::engine::PlotSeries,
            crate::engine::MapLayer,
            crate::registry::Field,
            crate::registry::FieldSpec,
            crate::series::SeriesView,
            crate::series::ScalarSample,
            crate::series::ViewWindow,
            crate::series::YRange,
            crate::series::AxisRange,
            crate::locator::GeoPoint,
            crate::geo::Origin,
            crate::track::PositionSample,
        )
    ),
    info(
        title = "NUI Scalar Data API",
        description = "Geolocated scalar telemetry: field subscriptions, plot window and map layers",
        version = "0.1.0"
    ),
    tags(
        (name = "status", description = "Session state"),
        (name = "fields", description = "Field subscriptions"),
        (name = "plot", description = "Time-series plot"),
        (name = "map", description = "Map layers and cursor"),
        (name = "messages", description = "In-process bus input")
    )
)]
pub struct ApiDoc;
