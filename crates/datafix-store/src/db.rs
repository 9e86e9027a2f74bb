//! Migrate-on-read record database.
//!
//! `RecordDb` wraps a storage backend and a finalised [`DataFixer`]. Records
//! are stored as JSON with their data version; loading one runs every fixer
//! between its stamp and the current version, and optionally writes the
//! migrated record back so the work is done once.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use datafix::{DataFixerBuilder, Record, Schema, TypeId, TypeTemplate};
//! use datafix_store::{MemoryStore, RecordDb, StateStore};
//!
//! let mut builder = DataFixerBuilder::new(1);
//! builder.add_schema(0, Schema::new().with_type(TypeId::block("old"), TypeTemplate::open())).unwrap();
//! builder.add_schema(1, Schema::new().with_type(TypeId::block("new"), TypeTemplate::open())).unwrap();
//! builder.rename_type("old to new", 1, TypeId::block("old"), "new");
//! let fixer = Arc::new(builder.build().unwrap());
//!
//! let mut store = MemoryStore::new();
//! store.put("blocks", "b1", br#"{"type":{"kind":"block","name":"old"},"version":0}"#).unwrap();
//!
//! let mut db = RecordDb::new(store, fixer);
//! let record = db.load("blocks", "b1").unwrap().unwrap();
//! assert_eq!(record.type_id, TypeId::block("new"));
//! assert_eq!(record.version, Some(1));
//! ```

use std::fmt;
use std::sync::Arc;

use datafix::{DataFixer, MigrationError, Record};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::traits::StateStore;

/// The default namespace failing records are moved to.
const QUARANTINE_NAMESPACE: &str = "quarantine";

/// Error type for `RecordDb` operations.
#[derive(Debug, Error)]
pub enum DbError<E: fmt::Debug + fmt::Display> {
    /// Error from the underlying storage backend.
    #[error("store error: {0}")]
    Store(E),
    /// The stored bytes are not a record.
    #[error("could not decode record {key}: {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },
    /// The record could not be serialized.
    #[error("could not encode record {key}: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
    /// A fixer rejected the record.
    #[error("record {key} did not migrate: {source}")]
    Migration { key: String, source: MigrationError },
}

/// Configuration for `RecordDb`.
#[derive(Debug, Clone)]
pub struct RecordDbConfig {
    /// Persist a record again after migrating it on read.
    pub write_back_on_read: bool,
    /// Where `load_all` moves records that cannot be loaded.
    pub quarantine_namespace: String,
}

impl Default for RecordDbConfig {
    fn default() -> Self {
        Self {
            write_back_on_read: true,
            quarantine_namespace: QUARANTINE_NAMESPACE.to_string(),
        }
    }
}

/// Outcome of loading a whole namespace.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Records that loaded, by key, at the current data version (or their
    /// own, newer one).
    pub loaded: Vec<(String, Record)>,
    /// Keys moved to the quarantine namespace.
    pub quarantined: Vec<String>,
}

/// Builder for constructing a `RecordDb` with custom configuration.
pub struct RecordDbBuilder<S: StateStore> {
    store: S,
    fixer: Arc<DataFixer>,
    config: RecordDbConfig,
}

impl<S: StateStore> RecordDbBuilder<S> {
    pub fn write_back_on_read(mut self, enabled: bool) -> Self {
        self.config.write_back_on_read = enabled;
        self
    }

    pub fn quarantine_namespace(mut self, ns: &str) -> Self {
        self.config.quarantine_namespace = ns.to_string();
        self
    }

    /// Build the `RecordDb`.
    pub fn build(self) -> RecordDb<S> {
        RecordDb {
            store: self.store,
            fixer: self.fixer,
            config: self.config,
        }
    }
}

/// Record database with migration on read.
///
/// Wraps any [`StateStore`] backend. The [`DataFixer`] is shared, so several
/// databases (one per region, dimension, save slot...) can use one chain.
pub struct RecordDb<S: StateStore> {
    store: S,
    fixer: Arc<DataFixer>,
    config: RecordDbConfig,
}

impl<S: StateStore> RecordDb<S> {
    /// Create a `RecordDb` with default config.
    pub fn new(store: S, fixer: Arc<DataFixer>) -> Self {
        Self {
            store,
            fixer,
            config: RecordDbConfig::default(),
        }
    }

    /// Create a builder for advanced configuration.
    pub fn builder(store: S, fixer: Arc<DataFixer>) -> RecordDbBuilder<S> {
        RecordDbBuilder {
            store,
            fixer,
            config: RecordDbConfig::default(),
        }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a mutable reference to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn fixer(&self) -> &DataFixer {
        &self.fixer
    }

    pub fn config(&self) -> &RecordDbConfig {
        &self.config
    }

    /// Save a record, stamping it with the current data version.
    pub fn save(
        &mut self,
        namespace: &str,
        key: &str,
        record: &Record,
    ) -> Result<(), DbError<S::Error>> {
        let mut stamped = record.clone();
        stamped.stamp(self.fixer.current_version());
        self.put_record(namespace, key, &stamped)
    }

    /// Load a record, migrating it to the current data version.
    ///
    /// A record whose stamp changed is written back when
    /// `write_back_on_read` is set. Records from a newer release come back
    /// untouched under the default future-version policy.
    pub fn load(
        &mut self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<Record>, DbError<S::Error>> {
        let Some(raw) = self.store.get(namespace, key).map_err(DbError::Store)? else {
            return Ok(None);
        };

        let record: Record = serde_json::from_slice(&raw).map_err(|source| DbError::Decode {
            key: key.to_string(),
            source,
        })?;

        let from = self.fixer.effective_version(&record);
        let (mut migrated, version) = self
            .fixer
            .migrate(&record, from, self.fixer.current_version())
            .map_err(|source| DbError::Migration {
                key: key.to_string(),
                source,
            })?;
        migrated.stamp(version);

        if record.version != Some(version) && self.config.write_back_on_read {
            debug!(namespace, key, from, to = version, "writing migrated record back");
            self.put_record(namespace, key, &migrated)?;
        }

        Ok(Some(migrated))
    }

    /// Load every record in a namespace.
    ///
    /// Records that fail to decode or migrate are moved to the quarantine
    /// namespace under `"{namespace}/{key}"` and the rest of the batch
    /// carries on. Only store errors abort the whole load.
    pub fn load_all(&mut self, namespace: &str) -> Result<LoadReport, DbError<S::Error>> {
        let mut report = LoadReport::default();
        for key in self.store.list_keys(namespace).map_err(DbError::Store)? {
            match self.load(namespace, &key) {
                Ok(Some(record)) => report.loaded.push((key, record)),
                Ok(None) => {}
                Err(DbError::Store(e)) => return Err(DbError::Store(e)),
                Err(err) => {
                    warn!(namespace, key = %key, error = %err, "record failed to load");
                    self.quarantine(namespace, &key)?;
                    report.quarantined.push(key);
                }
            }
        }

        if !report.quarantined.is_empty() {
            info!(
                namespace,
                loaded = report.loaded.len(),
                quarantined = report.quarantined.len(),
                quarantine = %self.config.quarantine_namespace,
                "quarantined records that could not be loaded"
            );
        }
        Ok(report)
    }

    /// Keys currently held in quarantine.
    pub fn quarantined(&self) -> Result<Vec<String>, DbError<S::Error>> {
        self.store
            .list_keys(&self.config.quarantine_namespace)
            .map_err(DbError::Store)
    }

    /// Delete a record.
    pub fn delete(&mut self, namespace: &str, key: &str) -> Result<(), DbError<S::Error>> {
        self.store.delete(namespace, key).map_err(DbError::Store)
    }

    /// List all keys in a namespace.
    pub fn list_keys(&self, namespace: &str) -> Result<Vec<String>, DbError<S::Error>> {
        self.store.list_keys(namespace).map_err(DbError::Store)
    }

    /// Check if a key exists in a namespace.
    pub fn exists(&self, namespace: &str, key: &str) -> Result<bool, DbError<S::Error>> {
        self.store.exists(namespace, key).map_err(DbError::Store)
    }

    fn put_record(
        &mut self,
        namespace: &str,
        key: &str,
        record: &Record,
    ) -> Result<(), DbError<S::Error>> {
        let bytes = serde_json::to_vec(record).map_err(|source| DbError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store
            .put(namespace, key, &bytes)
            .map_err(DbError::Store)
    }

    /// Move the raw bytes untouched, so nothing is lost.
    fn quarantine(&mut self, namespace: &str, key: &str) -> Result<(), DbError<S::Error>> {
        let Some(raw) = self.store.get(namespace, key).map_err(DbError::Store)? else {
            return Ok(());
        };
        let target = format!("{namespace}/{key}");
        self.store
            .put(&self.config.quarantine_namespace, &target, &raw)
            .map_err(DbError::Store)?;
        self.store.delete(namespace, key).map_err(DbError::Store)
    }
}
