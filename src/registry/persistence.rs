use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::error::PersistenceError;

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Host-owned key-value store the subscription snapshot is saved in.
pub trait Persistence: Send + Sync {
    fn read_entry(&self, section: &str, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write_entry(&self, section: &str, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Project file of `section -> key -> string` entries, stored as YAML.
pub struct YamlFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl YamlFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Sections, PersistenceError> {
        if !self.path.exists() {
            return Ok(Sections::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Sections::new());
        }
        Ok(serde_yaml::from_str(&content)?)
    }
}

impl Persistence for YamlFileStore {
    fn read_entry(&self, section: &str, key: &str) -> Result<Option<String>, PersistenceError> {
        let sections = self.load()?;
        Ok(sections.get(section).and_then(|s| s.get(key)).cloned())
    }

    fn write_entry(&self, section: &str, key: &str, value: &str) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut sections = self.load()?;
        sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_yaml::to_string(&sections)?)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    sections: Mutex<Sections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryStore {
    fn read_entry(&self, section: &str, key: &str) -> Result<Option<String>, PersistenceError> {
        let sections = self.sections.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(sections.get(section).and_then(|s| s.get(key)).cloned())
    }

    fn write_entry(&self, section: &str, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut sections = self.sections.lock().unwrap_or_else(PoisonError::into_inner);
        sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
