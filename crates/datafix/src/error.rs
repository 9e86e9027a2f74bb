use thiserror::Error;

use crate::record::TypeId;

/// A misconfigured schema registry or fixer chain.
///
/// Raised while the chain is being assembled at start-up. None of these are
/// recoverable: a chain that fails to build must never migrate a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A schema with this version is already registered.
    #[error("schema v{0} is already registered")]
    DuplicateVersion(u32),
    /// Schemas must be registered in strictly increasing version order.
    #[error("schema v{version} registered after v{latest}")]
    OutOfOrder { version: u32, latest: u32 },
    /// A type rename references a type the previous schema does not know.
    #[error("fixer `{fixer}` renames {type_id}, which schema v{schema} does not declare")]
    MissingPriorType {
        fixer: String,
        type_id: TypeId,
        schema: u32,
    },
    /// The declared current version disagrees with the registered schemas.
    #[error("declared data version v{declared} but the newest schema is v{registered}")]
    VersionMismatch { declared: u32, registered: u32 },
    /// `build()` was called without any schema.
    #[error("no schemas registered")]
    NoSchemas,
    /// A fixer is bound to a version with no schema, or to the oldest one.
    #[error("fixer `{name}` is bound to v{version}, which has no previous schema")]
    UnboundFixer { name: String, version: u32 },
    /// A fixer targets a type unknown to the schema it upgrades from.
    #[error("fixer `{fixer}` targets {type_id}, unknown at schema v{schema}")]
    UnknownType {
        fixer: String,
        type_id: TypeId,
        schema: u32,
    },
    /// A field rename or remap names a field the type's template lacks.
    #[error("fixer `{fixer}` names field `{field}` not declared by {type_id}")]
    UnknownField {
        fixer: String,
        type_id: TypeId,
        field: String,
    },
    /// A remap table would change its own output on a second run.
    #[error("remap `{fixer}` is not idempotent: {value} is both an input and an output")]
    NonIdempotentRemap { fixer: String, value: String },
    /// A field path is empty or has an empty segment.
    #[error("invalid field path `{0}`")]
    InvalidPath(String),
}

/// Failure while migrating a single record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MigrationError {
    /// A fixer returned an error. Nothing of the partial result survives.
    #[error("fixer `{fixer}` failed on {type_id}: {reason}")]
    Failed {
        fixer: String,
        type_id: TypeId,
        reason: FixError,
    },
    /// The record is newer than this build and the policy rejects it.
    #[error("data version v{found} is newer than current v{current}")]
    FutureVersion { found: u32, current: u32 },
}

/// Error returned by a structural rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixError {
    /// The rewrite needs a field the record does not carry.
    #[error("missing field `{0}`")]
    MissingField(String),
    /// A field holds a value the rewrite cannot interpret.
    #[error("unexpected value for `{field}`: {found}")]
    UnexpectedValue { field: String, found: String },
    /// Free-form failure.
    #[error("{0}")]
    Custom(String),
}

impl FixError {
    /// Shorthand for [`FixError::UnexpectedValue`].
    pub fn unexpected(field: &str, found: &serde_json::Value) -> Self {
        Self::UnexpectedValue {
            field: field.to_string(),
            found: found.to_string(),
        }
    }
}

/// A schema lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No registered schema at or below the requested version.
    #[error("no schema registered at or below v{0}")]
    NoSchema(u32),
    /// No schema at or below `version` declares this type.
    #[error("{type_id} is unknown at schema v{version}")]
    UnknownType { type_id: TypeId, version: u32 },
}
