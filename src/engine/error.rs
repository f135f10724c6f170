use thiserror::Error;

use crate::locator::LocateError;
use crate::registry::{PersistenceError, RegistryError};
use crate::series::SeriesError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Series(#[from] SeriesError),
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("invalid subscription snapshot: {0}")]
    Snapshot(#[from] serde_yaml::Error),
    #[error("failed to start delivery thread: {0}")]
    Spawn(#[from] std::io::Error),
}
