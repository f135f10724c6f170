use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("invalid time window: {0}")]
    InvalidWindow(String),
    #[error("no series for field '{0}'")]
    UnknownField(String),
}
