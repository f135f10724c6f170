use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::RegistryError;
use super::field::{Field, FieldSpec};

/// Persisted form of the registry: key -> registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
}

impl RegistrySnapshot {
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Active field subscriptions, unique by `channel/field` key.
///
/// Metadata only: the series buffers and transport handles for a field are
/// owned elsewhere and torn down by the caller.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    fields: BTreeMap<String, Field>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, spec: FieldSpec) -> Result<String, RegistryError> {
        spec.validate()?;
        let key = spec.key();
        if self.fields.contains_key(&key) {
            return Err(RegistryError::DuplicateField(key));
        }
        self.fields.insert(
            key.clone(),
            Field {
                key: key.clone(),
                spec,
            },
        );
        Ok(key)
    }

    pub fn remove(&mut self, key: &str) -> Result<Field, RegistryError> {
        self.fields
            .remove(key)
            .ok_or_else(|| RegistryError::UnknownField(key.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            fields: self
                .fields
                .iter()
                .map(|(key, field)| (key.clone(), field.spec.clone()))
                .collect(),
        }
    }

    /// Replays `add` for every entry; one result per entry, in key order.
    pub fn restore(&mut self, snapshot: &RegistrySnapshot) -> Vec<Result<String, RegistryError>> {
        snapshot
            .fields
            .iter()
            .map(|(stored_key, spec)| {
                if *stored_key != spec.key() {
                    log::warn!(
                        "Persisted field '{}' registers as '{}'",
                        stored_key,
                        spec.key()
                    );
                }
                self.add(spec.clone())
            })
            .collect()
    }
}
