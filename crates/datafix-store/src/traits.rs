use std::fmt;

/// Core trait for record persistence.
///
/// Every backend implements this trait. It provides simple key-value
/// operations scoped by a namespace (analogous to a table or a region file).
///
/// Values are opaque bytes: the store does not interpret records. Versioning
/// and migration are handled by [`RecordDb`](crate::RecordDb) on top of it.
pub trait StateStore {
    /// Error type for this backend.
    type Error: fmt::Debug + fmt::Display;

    /// Store a value under `(namespace, key)`, replacing any previous value.
    fn put(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), Self::Error>;

    /// Retrieve a value by `(namespace, key)`.
    /// Returns `None` if the key does not exist.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Delete a value by `(namespace, key)`. Deleting a missing key is not an error.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), Self::Error>;

    /// List all keys in a namespace, in ascending order.
    fn list_keys(&self, namespace: &str) -> Result<Vec<String>, Self::Error>;

    /// Check if a key exists in a namespace.
    fn exists(&self, namespace: &str, key: &str) -> Result<bool, Self::Error> {
        Ok(self.get(namespace, key)?.is_some())
    }
}
