use std::collections::BTreeMap;

use thiserror::Error;

use crate::traits::StateStore;

/// In-memory storage backend.
///
/// All data is stored in a `BTreeMap`, nothing touches disk.
/// Ideal for testing and prototyping.
///
/// # Example
///
/// ```
/// use datafix_store::{MemoryStore, StateStore};
///
/// let mut store = MemoryStore::new();
/// store.put("chunks", "0,0", b"{}").unwrap();
///
/// let data = store.get("chunks", "0,0").unwrap().unwrap();
/// assert_eq!(data, b"{}");
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    /// (namespace, key) -> value
    state: BTreeMap<(String, String), Vec<u8>>,
}

/// Error type for the in-memory backend.
///
/// This backend never actually fails, but the trait requires an error type.
#[derive(Debug, Clone, Error)]
#[error("memory store error: {0}")]
pub struct MemoryError(String);

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of entries across all namespaces.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Every namespace holding at least one entry.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.keys().map(|(ns, _)| ns.clone()).collect();
        names.dedup();
        names
    }

    fn ns_key(namespace: &str, key: &str) -> (String, String) {
        (namespace.to_string(), key.to_string())
    }
}

impl StateStore for MemoryStore {
    type Error = MemoryError;

    fn put(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.state
            .insert(Self::ns_key(namespace, key), value.to_vec());
        Ok(())
    }

    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.state.get(&Self::ns_key(namespace, key)).cloned())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), Self::Error> {
        self.state.remove(&Self::ns_key(namespace, key));
        Ok(())
    }

    fn list_keys(&self, namespace: &str) -> Result<Vec<String>, Self::Error> {
        let keys = self
            .state
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, k)| k.clone())
            .collect();
        Ok(keys)
    }

    fn exists(&self, namespace: &str, key: &str) -> Result<bool, Self::Error> {
        Ok(self.state.contains_key(&Self::ns_key(namespace, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let mut store = MemoryStore::new();

        store.put("ns", "k1", b"hello").unwrap();
        assert_eq!(store.get("ns", "k1").unwrap(), Some(b"hello".to_vec()));

        store.put("ns", "k1", b"world").unwrap();
        assert_eq!(store.get("ns", "k1").unwrap(), Some(b"world".to_vec()));

        store.delete("ns", "k1").unwrap();
        assert_eq!(store.get("ns", "k1").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn namespace_isolation() {
        let mut store = MemoryStore::new();
        store.put("a", "k1", b"alpha").unwrap();
        store.put("b", "k1", b"beta").unwrap();

        assert_eq!(store.get("a", "k1").unwrap(), Some(b"alpha".to_vec()));
        assert_eq!(store.get("b", "k1").unwrap(), Some(b"beta".to_vec()));
        assert_eq!(store.namespaces(), vec!["a", "b"]);
    }

    #[test]
    fn list_keys_is_sorted_and_scoped() {
        let mut store = MemoryStore::new();
        store.put("ns", "b", b"2").unwrap();
        store.put("ns", "a", b"1").unwrap();
        store.put("other", "c", b"3").unwrap();

        assert_eq!(store.list_keys("ns").unwrap(), vec!["a", "b"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn exists() {
        let mut store = MemoryStore::new();
        assert!(!store.exists("ns", "k").unwrap());
        store.put("ns", "k", b"v").unwrap();
        assert!(store.exists("ns", "k").unwrap());
    }

    #[test]
    fn delete_missing_is_ok() {
        let mut store = MemoryStore::new();
        store.delete("ns", "nope").unwrap();
    }
}
