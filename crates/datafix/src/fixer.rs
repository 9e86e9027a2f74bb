use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ConfigError, FixError};
use crate::record::{Record, RecordKind, TypeId};
use crate::schema::VersionedSchema;
use crate::value::{self, FieldPath};

/// A caller-supplied transformation of one record's data tree.
///
/// Implementations must be **deterministic and pure**, and must leave data
/// they already rewrote untouched when run a second time.
///
/// Any `Fn(&mut Value) -> Result<(), FixError>` closure is a `Rewrite`.
pub trait Rewrite: Send + Sync {
    fn rewrite(&self, data: &mut Value) -> Result<(), FixError>;
}

impl<F> Rewrite for F
where
    F: Fn(&mut Value) -> Result<(), FixError> + Send + Sync,
{
    fn rewrite(&self, data: &mut Value) -> Result<(), FixError> {
        self(data)
    }
}

/// Exact-match renames.
#[derive(Debug, Clone, PartialEq)]
pub enum Rename {
    /// Rename a type, keeping its kind. Also rewrites embedded identifiers
    /// of that kind under the reference paths of the record's template.
    Type { from: TypeId, to: String },
    /// Rename the final key of `from` on records of `type_id`.
    Field {
        type_id: TypeId,
        from: FieldPath,
        to: String,
    },
}

/// Replace enumerated scalar values of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRemap {
    pub type_id: TypeId,
    pub field: FieldPath,
    pub table: Vec<(Value, Value)>,
}

/// Arbitrary restructuring of one type's data.
#[derive(Clone)]
pub struct StructuralRewrite {
    pub type_id: TypeId,
    pub rewrite: Arc<dyn Rewrite>,
}

impl fmt::Debug for StructuralRewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuralRewrite")
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

/// The closed set of fixer kinds.
#[derive(Debug, Clone)]
pub enum FixerKind {
    Rename(Rename),
    ValueRemap(ValueRemap),
    StructuralRewrite(StructuralRewrite),
}

/// Schemas a fixer sees while it runs: the one it upgrades from and the one
/// it produces.
#[derive(Debug, Clone, Copy)]
pub struct FixContext<'a> {
    pub prior: &'a VersionedSchema,
    pub target: &'a VersionedSchema,
}

impl<'a> FixContext<'a> {
    /// Reference paths of `type_id` in either schema; the prior one wins.
    fn references(&self, type_id: &TypeId) -> BTreeMap<&'a FieldPath, RecordKind> {
        let mut references = self.target.references(type_id);
        references.extend(self.prior.references(type_id));
        references
    }
}

/// An atomic transformation bound to the schema version it produces.
///
/// A fixer at version `V` carries data from the previous registered schema
/// to `V`, and runs on every record stamped below `V`.
#[derive(Debug, Clone)]
pub struct Fixer {
    name: String,
    version: u32,
    kind: FixerKind,
}

impl Fixer {
    pub fn new(name: impl Into<String>, version: u32, kind: FixerKind) -> Self {
        Self {
            name: name.into(),
            version,
            kind,
        }
    }

    /// Rename type `from` to `to` (same kind).
    pub fn rename_type(
        name: impl Into<String>,
        version: u32,
        from: TypeId,
        to: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            version,
            FixerKind::Rename(Rename::Type { from, to: to.into() }),
        )
    }

    /// Rename the field at dotted path `from` to `to` on `type_id`.
    pub fn rename_field(
        name: impl Into<String>,
        version: u32,
        type_id: TypeId,
        from: &str,
        to: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            name,
            version,
            FixerKind::Rename(Rename::Field {
                type_id,
                from: FieldPath::parse(from)?,
                to: to.into(),
            }),
        ))
    }

    /// Remap scalar values of `field` on `type_id`.
    pub fn remap(
        name: impl Into<String>,
        version: u32,
        type_id: TypeId,
        field: &str,
        table: Vec<(Value, Value)>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            name,
            version,
            FixerKind::ValueRemap(ValueRemap {
                type_id,
                field: FieldPath::parse(field)?,
                table,
            }),
        ))
    }

    /// Restructure records of `type_id` with a closure.
    pub fn rewrite<F>(name: impl Into<String>, version: u32, type_id: TypeId, rewrite: F) -> Self
    where
        F: Fn(&mut Value) -> Result<(), FixError> + Send + Sync + 'static,
    {
        Self::rewrite_with(name, version, type_id, Arc::new(rewrite))
    }

    /// Restructure records of `type_id` with a shared [`Rewrite`].
    pub fn rewrite_with(
        name: impl Into<String>,
        version: u32,
        type_id: TypeId,
        rewrite: Arc<dyn Rewrite>,
    ) -> Self {
        Self::new(
            name,
            version,
            FixerKind::StructuralRewrite(StructuralRewrite { type_id, rewrite }),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn kind(&self) -> &FixerKind {
        &self.kind
    }

    /// The type this fixer matches on.
    pub fn target(&self) -> &TypeId {
        match &self.kind {
            FixerKind::Rename(Rename::Type { from, .. }) => from,
            FixerKind::Rename(Rename::Field { type_id, .. })
            | FixerKind::ValueRemap(ValueRemap { type_id, .. })
            | FixerKind::StructuralRewrite(StructuralRewrite { type_id, .. }) => type_id,
        }
    }

    /// Apply this fixer to `record` in place. Records of other types pass
    /// through untouched, except for embedded references a type rename follows.
    pub fn apply(&self, record: &mut Record, ctx: FixContext<'_>) -> Result<(), FixError> {
        match &self.kind {
            FixerKind::Rename(Rename::Type { from, to }) => {
                for (path, kind) in ctx.references(&record.type_id) {
                    if kind != from.kind {
                        continue;
                    }
                    if let Some(node) = value::get_mut(&mut record.data, path) {
                        rename_embedded(node, kind, &from.name, to);
                    }
                }
                if record.type_id == *from {
                    record.type_id.name = to.clone();
                }
            }
            FixerKind::Rename(Rename::Field { type_id, from, to }) => {
                if record.type_id == *type_id {
                    value::rename_key(&mut record.data, from, to);
                }
            }
            FixerKind::ValueRemap(remap) => {
                if record.type_id == remap.type_id {
                    value::replace_scalar(&mut record.data, &remap.field, &remap.table);
                }
            }
            FixerKind::StructuralRewrite(rewrite) => {
                if record.type_id == rewrite.type_id {
                    rewrite.rewrite.rewrite(&mut record.data)?;
                }
            }
        }
        Ok(())
    }
}

/// Rename embedded identifiers: a bare string, a map keyed by the kind's id
/// key, or a list of either.
fn rename_embedded(node: &mut Value, kind: RecordKind, from: &str, to: &str) {
    match node {
        Value::String(id) if id == from => *id = to.to_string(),
        Value::Array(items) => {
            for item in items {
                rename_embedded(item, kind, from, to);
            }
        }
        Value::Object(map) => {
            if let Some(Value::String(id)) = map.get_mut(kind.id_key()) {
                if id == from {
                    *id = to.to_string();
                }
            }
        }
        _ => {}
    }
}
