mod error;
mod field;
mod persistence;
mod registry;

pub use error::{PersistenceError, RegistryError};
pub use field::{field_key, Field, FieldSpec};
pub use persistence::{MemoryStore, Persistence, YamlFileStore};
pub use registry::{RegistrySnapshot, SubscriptionRegistry};
