mod error;
mod position_track;
mod sample;

pub use error::TrackError;
pub use position_track::PositionTrack;
pub use sample::PositionSample;
