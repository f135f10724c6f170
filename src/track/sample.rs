use serde::Serialize;
use utoipa::ToSchema;

/// Vehicle position in the local frame, meters from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct PositionSample {
    /// Seconds since the Unix epoch.
    pub time: f64,
    pub x: f64,
    pub y: f64,
}
