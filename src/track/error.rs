use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("position track is empty")]
    NotReady,
    #[error("query time {0} is not a finite number")]
    InvalidTime(f64),
    #[error("stale position sample at t={time} (track ends at t={last})")]
    Stale { time: f64, last: f64 },
}
