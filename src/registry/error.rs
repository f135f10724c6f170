use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate field '{0}'")]
    DuplicateField(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("invalid field: {0}")]
    InvalidField(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
