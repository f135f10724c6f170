use thiserror::Error;

use super::bus::SubscriptionId;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unknown subscription {0}")]
    UnknownSubscription(SubscriptionId),
    #[error("transport disconnected")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message has no field '{0}'")]
    MissingField(String),
    #[error("field '{field}' is not {expected}")]
    TypeMismatch { field: String, expected: &'static str },
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
