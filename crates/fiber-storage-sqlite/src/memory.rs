//! In-memory storage
//!
//! Keeps everything in process memory. Handles produced by [`MemoryStorage::reopen`]
//! share the same data, so a close/reopen cycle behaves like reopening a file.

use crate::storage::{ConfigRecord, Storage};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Path reported by in-memory stores
pub const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Default)]
struct MemoryData {
    config: Option<ConfigRecord>,
    values: BTreeMap<u64, Vec<u8>>,
    next_id: u64,
}

/// Storage that lives only in memory
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    path: Option<PathBuf>,
    data: Arc<RwLock<MemoryData>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Create an empty, open store
    pub fn new() -> Self {
        Self {
            path: Some(PathBuf::from(MEMORY_PATH)),
            data: Arc::new(RwLock::new(MemoryData {
                next_id: 1,
                ..MemoryData::default()
            })),
        }
    }

    /// Open a new handle over the same data
    pub fn reopen(&self) -> Self {
        Self {
            path: Some(PathBuf::from(MEMORY_PATH)),
            data: Arc::clone(&self.data),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.path.is_none() {
            return Err(Error::NotOpen);
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn insert_config(&mut self, config: ConfigRecord) -> Result<()> {
        self.ensure_open()?;
        if config.is_empty() {
            return Err(Error::Config("Config record is empty".to_string()));
        }
        let mut data = self.data.write();
        if data.config.is_some() {
            return Err(Error::AlreadyInitialized);
        }
        data.config = Some(config);
        Ok(())
    }

    fn get_config(&self) -> Result<Option<ConfigRecord>> {
        self.ensure_open()?;
        Ok(self.data.read().config.clone())
    }

    fn insert_value(&mut self, value: &[u8]) -> Result<u64> {
        self.ensure_open()?;
        let mut data = self.data.write();
        let id = data.next_id;
        data.next_id += 1;
        data.values.insert(id, value.to_vec());
        Ok(id)
    }

    fn get_value(&self, id: u64) -> Result<Vec<u8>> {
        self.ensure_open()?;
        self.data
            .read()
            .values
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound(id))
    }

    fn list_values(&self) -> Result<BTreeMap<u64, Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.data.read().values.clone())
    }

    fn update_value(&mut self, id: u64, value: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let mut data = self.data.write();
        match data.values.get_mut(&id) {
            Some(slot) => {
                *slot = value.to_vec();
                Ok(())
            }
            None => Err(Error::NotFound(id)),
        }
    }

    fn delete_value(&mut self, id: u64) -> Result<()> {
        self.ensure_open()?;
        self.data
            .write()
            .values
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::NotFound(id))
    }

    fn count_values(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.data.read().values.len() as u64)
    }

    fn close(&mut self) -> Result<()> {
        self.path = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut storage = MemoryStorage::new();
        let a = storage.insert_value(b"a").unwrap();
        storage.delete_value(a).unwrap();
        let b = storage.insert_value(b"b").unwrap();
        assert_eq!((a, b), (1, 2));
    }

    #[test]
    fn test_reopen_shares_data() {
        let mut storage = MemoryStorage::new();
        storage.insert_value(b"kept").unwrap();
        storage.close().unwrap();
        assert!(matches!(storage.get_value(1), Err(Error::NotOpen)));

        let reopened = storage.reopen();
        assert_eq!(reopened.get_value(1).unwrap(), b"kept");
        assert_eq!(reopened.path(), Some(Path::new(MEMORY_PATH)));
    }

    fn sample_config() -> ConfigRecord {
        let mut config = ConfigRecord::new();
        config.insert("secType".to_string(), "0".to_string());
        config
    }

    #[test]
    fn test_config_written_once() {
        let mut storage = MemoryStorage::new();
        storage.insert_config(sample_config()).unwrap();
        assert_eq!(storage.get_config().unwrap(), Some(sample_config()));
        assert!(matches!(
            storage.insert_config(sample_config()),
            Err(Error::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_empty_config_rejected() {
        let mut storage = MemoryStorage::new();
        assert!(matches!(
            storage.insert_config(ConfigRecord::new()),
            Err(Error::Config(_))
        ));
        assert!(storage.get_config().unwrap().is_none());
    }
}
