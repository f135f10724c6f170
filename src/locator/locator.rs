use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::error::LocateError;
use crate::geo::{to_geo, Origin};
use crate::track::PositionTrack;

/// A timestamped point placed on the vehicle track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GeoPoint {
    pub time: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Local-frame position the point was interpolated at.
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl GeoPoint {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = self.time.floor();
        let nanos = ((self.time - secs) * 1e9).round() as u32;
        DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
    }
}

/// Places timestamps on the shared position track.
///
/// The origin is set once per session; until then every lookup fails with
/// `Uninitialized`. Only the interpolation touches the track lock.
#[derive(Debug)]
pub struct GeoLocator {
    track: Arc<PositionTrack>,
    origin: OnceLock<Origin>,
}

impl GeoLocator {
    pub fn new(track: Arc<PositionTrack>) -> Self {
        Self {
            track,
            origin: OnceLock::new(),
        }
    }

    pub fn track(&self) -> &Arc<PositionTrack> {
        &self.track
    }

    pub fn origin(&self) -> Option<Origin> {
        self.origin.get().copied()
    }

    pub fn is_initialized(&self) -> bool {
        self.origin.get().is_some()
    }

    pub fn initialize_origin(&self, origin: Origin) -> Result<Origin, LocateError> {
        if !origin.is_valid() {
            return Err(LocateError::InvalidOrigin {
                latitude: origin.latitude_deg,
                longitude: origin.longitude_deg,
            });
        }
        self.origin
            .set(origin)
            .map_err(|_| LocateError::AlreadyInitialized)?;
        Ok(origin)
    }

    pub fn locate(&self, time: f64, value: f64) -> Result<GeoPoint, LocateError> {
        let mut point = self.locate_cursor(time)?;
        point.value = Some(value);
        Ok(point)
    }

    /// Position lookup without a measurement, for the interactive cursor.
    pub fn locate_cursor(&self, time: f64) -> Result<GeoPoint, LocateError> {
        let origin = self.origin.get().ok_or(LocateError::Uninitialized)?;
        let (x, y) = self.track.interpolate(time)?;
        let (latitude, longitude) = to_geo(x, y, origin);
        Ok(GeoPoint {
            time,
            latitude,
            longitude,
            x,
            y,
            value: None,
        })
    }
}
