// src/storage.rs
// Key-value persistence seam shared by the event sink and counters.

use spin_sdk::key_value::Store;

/// Minimal KV surface used by the gate. Errors are opaque; callers only
/// need to know that a write or read did not happen.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ()>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), ()>;
    fn delete(&self, key: &str) -> Result<(), ()>;
    fn get_keys(&self) -> Result<Vec<String>, ()> {
        Ok(Vec::new())
    }
}

impl KeyValueStore for Store {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ()> {
        Store::get(self, key).map_err(|_| ())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), ()> {
        Store::set(self, key, value).map_err(|_| ())
    }

    fn delete(&self, key: &str) -> Result<(), ()> {
        Store::delete(self, key).map_err(|_| ())
    }

    fn get_keys(&self) -> Result<Vec<String>, ()> {
        Store::get_keys(self).map_err(|_| ())
    }
}

/// Read a decimal counter value, treating missing or corrupt entries as zero.
pub(crate) fn read_u64(store: &dyn KeyValueStore, key: &str) -> u64 {
    store
        .get(key)
        .ok()
        .flatten()
        .and_then(|v| String::from_utf8(v).ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}
