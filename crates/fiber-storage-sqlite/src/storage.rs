//! Key-value storage contract used by the address book
//!
//! A store holds one configuration record plus any number of opaque value
//! blobs keyed by a store-assigned, monotonically increasing ID. IDs are
//! never handed out twice, even after the value that held them is deleted.

use crate::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration record (single slot per store)
pub type ConfigRecord = BTreeMap<String, String>;

/// Ordered key-value store backing an address book
pub trait Storage: Send + Sync {
    /// Location of the open store; `None` once closed
    fn path(&self) -> Option<&Path>;

    /// Write the configuration record.
    ///
    /// Fails with [`Error::AlreadyInitialized`](crate::Error::AlreadyInitialized)
    /// if one has already been written, and with
    /// [`Error::Config`](crate::Error::Config) if `config` is empty.
    fn insert_config(&mut self, config: ConfigRecord) -> Result<()>;

    /// Read the configuration record, if any
    fn get_config(&self) -> Result<Option<ConfigRecord>>;

    /// Append a value and return its newly assigned ID
    fn insert_value(&mut self, value: &[u8]) -> Result<u64>;

    /// Read one value
    fn get_value(&self, id: u64) -> Result<Vec<u8>>;

    /// Read every value, ordered by ID
    fn list_values(&self) -> Result<BTreeMap<u64, Vec<u8>>>;

    /// Replace an existing value
    fn update_value(&mut self, id: u64, value: &[u8]) -> Result<()>;

    /// Remove an existing value
    fn delete_value(&mut self, id: u64) -> Result<()>;

    /// Number of stored values
    fn count_values(&self) -> Result<u64> {
        Ok(self.list_values()?.len() as u64)
    }

    /// Release the store. Closing twice is not an error.
    fn close(&mut self) -> Result<()>;

    /// Whether the store is open
    fn is_open(&self) -> bool {
        self.path().is_some()
    }
}
