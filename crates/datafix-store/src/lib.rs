//! # datafix-store
//!
//! Storage backends and a migrate-on-read loader for
//! [`datafix`](https://docs.rs/datafix).
//!
//! Provides a small storage abstraction for persisted records and
//! [`RecordDb`], which runs the fixer chain whenever an old record is read,
//! writes the upgraded record back, and quarantines records that cannot be
//! loaded instead of failing the whole batch.
//!
//! ## Quick Start
//!
//! ```
//! use datafix_store::{MemoryStore, StateStore};
//!
//! let mut store = MemoryStore::new();
//! store.put("chunks", "0,0", b"hello").unwrap();
//! let data = store.get("chunks", "0,0").unwrap();
//! assert_eq!(data.as_deref(), Some(b"hello".as_slice()));
//! ```
//!
//! ## Backends
//!
//! | Backend | Use case |
//! |---------|----------|
//! | [`MemoryStore`] | Testing, prototyping |
//!
//! Any key-value store can be plugged in by implementing [`StateStore`].

mod db;
mod memory;
mod traits;

pub use db::{DbError, LoadReport, RecordDb, RecordDbBuilder, RecordDbConfig};
pub use memory::{MemoryError, MemoryStore};
pub use traits::StateStore;
