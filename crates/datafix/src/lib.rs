//! # datafix
//!
//! Versioned record migrations.
//!
//! Persisted records carry an integer **data version**. As the software that
//! writes them evolves, each schema revision ships with a set of **fixers**
//! that carry records from the previous revision to the new one. When an old
//! record is loaded, the fixers between its stamp and the current version run
//! in order and the caller writes the new stamp back.
//!
//! ## How It Works
//!
//! 1. Schemas are registered once at start-up, in increasing version order.
//! 2. Fixers are bound to the schema version they produce and registered in
//!    the order they must run.
//! 3. [`DataFixerBuilder::build`] validates the whole chain (type history,
//!    declared fields, the current version) and freezes it.
//! 4. [`DataFixer::migrate`] applies the fixers in `(from, to]` to a copy of
//!    the record.
//!
//! ## Key Concepts
//!
//! - **Closed fixer set**: renames, value remaps and structural rewrites.
//! - **Deterministic**: fixers are pure tree transforms with no I/O.
//! - **Additive**: migrating v→w equals migrating v→m→w.
//! - **Pessimistic stamps**: an unstamped record is the oldest version.

mod engine;
mod error;
mod fixer;
#[cfg(feature = "manifest")]
pub mod manifest;
mod record;
mod schema;
pub mod value;

pub use engine::{
    DataFixer, DataFixerBuilder, FutureVersionPolicy, MigrationConfig, ShapeViolation,
};
pub use error::{ConfigError, FixError, MigrationError, SchemaError};
pub use fixer::{FixContext, Fixer, FixerKind, Rename, Rewrite, StructuralRewrite, ValueRemap};
pub use record::{Record, RecordKind, TypeId};
pub use schema::{Schema, SchemaRegistry, TypeTemplate, VersionedSchema};
pub use value::FieldPath;
