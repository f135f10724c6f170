use thiserror::Error;

use crate::track::TrackError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocateError {
    #[error("map origin not received yet")]
    Uninitialized,
    #[error("no vehicle positions received yet")]
    NotReady,
    #[error("map origin already set")]
    AlreadyInitialized,
    #[error("invalid origin: lat={latitude}, lon={longitude}")]
    InvalidOrigin { latitude: f64, longitude: f64 },
    #[error("invalid time {0}")]
    InvalidTime(f64),
}

impl From<TrackError> for LocateError {
    fn from(err: TrackError) -> Self {
        match err {
            TrackError::NotReady | TrackError::Stale { .. } => LocateError::NotReady,
            TrackError::InvalidTime(time) => LocateError::InvalidTime(time),
        }
    }
}
