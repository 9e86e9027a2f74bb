//! Declarative chains loaded from TOML.
//!
//! Renames and remaps are plain data; structural rewrites are code, so the
//! manifest names them and the caller supplies a [`RewriteCatalog`].
//!
//! ```toml
//! current_version = 2
//!
//! [[schema]]
//! version = 0
//! types = [
//!     { kind = "block", name = "wilderwild:display_lantern", fields = ["Properties.light"] },
//!     { kind = "block_entity", name = "wilderwild:stone_chest", references = { Items = "item" } },
//! ]
//! kind_references = [{ kind = "entity", path = "HandItems", embeds = "item" }]
//!
//! [[schema]]
//! version = 1
//!
//! [[fixer]]
//! version = 1
//! name = "display_lantern_rename_fix"
//! rename_field = { kind = "block", type = "wilderwild:display_lantern", from = "Properties.light", to = "display_light" }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::engine::{DataFixer, DataFixerBuilder, MigrationConfig};
use crate::error::ConfigError;
use crate::fixer::{Fixer, Rewrite};
use crate::record::{RecordKind, TypeId};
use crate::schema::{Schema, TypeTemplate};

/// Error loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The TOML is malformed or does not match the manifest layout.
    #[error("manifest parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// A fixer names a rewrite the catalog does not provide.
    #[error("fixer `{fixer}` uses unknown rewrite `{rewrite}`")]
    UnknownRewrite { fixer: String, rewrite: String },
    /// A fixer table declares no action, or more than one.
    #[error("fixer `{0}` must declare exactly one action")]
    Invalid(String),
    /// The chain itself is misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Named structural rewrites a manifest may refer to.
#[derive(Default, Clone)]
pub struct RewriteCatalog {
    rewrites: HashMap<String, Arc<dyn Rewrite>>,
}

impl RewriteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, rewrite: F) -> &mut Self
    where
        F: Fn(&mut Value) -> Result<(), crate::FixError> + Send + Sync + 'static,
    {
        self.rewrites.insert(name.into(), Arc::new(rewrite));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Rewrite>> {
        self.rewrites.get(name).cloned()
    }
}

/// Top-level manifest layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Must equal the newest schema version.
    pub current_version: u32,
    /// Reject records stamped newer than `current_version`.
    #[serde(default)]
    pub reject_future_versions: bool,
    /// Schema declarations, in increasing version order.
    #[serde(rename = "schema", default)]
    pub schemas: Vec<SchemaDecl>,
    /// Fixer declarations, in application order within each version.
    #[serde(rename = "fixer", default)]
    pub fixers: Vec<FixerDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDecl {
    pub version: u32,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub removed: Vec<TypeRef>,
    /// References every record of a kind carries.
    #[serde(default)]
    pub kind_references: Vec<KindReferenceDecl>,
}

/// `{ kind = "block_entity", path = "Items", embeds = "item" }`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KindReferenceDecl {
    pub kind: RecordKind,
    pub path: String,
    pub embeds: RecordKind,
}

/// One type declared by a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    #[serde(default = "generic_kind")]
    pub kind: RecordKind,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
    /// Field path → kind of the records embedded there.
    #[serde(default)]
    pub references: BTreeMap<String, RecordKind>,
    /// Accept any shape.
    #[serde(default)]
    pub open: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeRef {
    #[serde(default = "generic_kind")]
    pub kind: RecordKind,
    pub name: String,
}

fn generic_kind() -> RecordKind {
    RecordKind::Generic
}

impl TypeRef {
    fn type_id(&self) -> TypeId {
        TypeId::of(self.kind, self.name.clone())
    }
}

/// One fixer. Exactly one of the action tables must be present.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixerDecl {
    pub version: u32,
    pub name: String,
    pub rename_type: Option<RenameTypeDecl>,
    pub rename_field: Option<RenameFieldDecl>,
    pub remap: Option<RemapDecl>,
    pub rewrite: Option<RewriteDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameTypeDecl {
    #[serde(default = "generic_kind")]
    pub kind: RecordKind,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameFieldDecl {
    #[serde(default = "generic_kind")]
    pub kind: RecordKind,
    #[serde(rename = "type")]
    pub type_name: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemapDecl {
    #[serde(default = "generic_kind")]
    pub kind: RecordKind,
    #[serde(rename = "type")]
    pub type_name: String,
    pub field: String,
    /// `[[before, after], ...]`
    pub table: Vec<(Value, Value)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteDecl {
    #[serde(default = "generic_kind")]
    pub kind: RecordKind,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Key into the [`RewriteCatalog`].
    pub using: String,
}

impl Manifest {
    /// Parse a manifest from TOML source.
    pub fn parse(source: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(source)?)
    }

    /// Turn the manifest into a builder, resolving rewrites from `catalog`.
    pub fn into_builder(self, catalog: &RewriteCatalog) -> Result<DataFixerBuilder, ManifestError> {
        let mut builder = DataFixerBuilder::new(self.current_version);
        builder.config(MigrationConfig {
            future_versions: if self.reject_future_versions {
                crate::FutureVersionPolicy::Reject
            } else {
                crate::FutureVersionPolicy::PassThrough
            },
            ..MigrationConfig::default()
        });

        for decl in self.schemas {
            let mut schema = Schema::new();
            for ty in decl.types {
                let template = template_of(ty.fields, ty.references, ty.open)?;
                schema = schema.with_type(TypeId::of(ty.kind, ty.name), template);
            }
            for removed in &decl.removed {
                schema = schema.without_type(removed.type_id());
            }
            for reference in &decl.kind_references {
                schema =
                    schema.with_kind_reference(reference.kind, &reference.path, reference.embeds)?;
            }
            builder.add_schema(decl.version, schema)?;
        }

        for decl in self.fixers {
            builder.add_fixer(fixer_of(decl, catalog)?);
        }
        Ok(builder)
    }

    /// Parse, resolve and build in one step.
    pub fn load(source: &str, catalog: &RewriteCatalog) -> Result<DataFixer, ManifestError> {
        Ok(Self::parse(source)?.into_builder(catalog)?.build()?)
    }
}

fn template_of(
    fields: Vec<String>,
    references: BTreeMap<String, RecordKind>,
    open: bool,
) -> Result<TypeTemplate, ConfigError> {
    let base = if open {
        TypeTemplate::open()
    } else {
        TypeTemplate::new()
    };
    let with_fields = fields
        .iter()
        .try_fold(base, |template, field| template.with_field(field))?;
    references
        .iter()
        .try_fold(with_fields, |template, (path, kind)| template.with_reference(path, *kind))
}

fn fixer_of(decl: FixerDecl, catalog: &RewriteCatalog) -> Result<Fixer, ManifestError> {
    let FixerDecl {
        version,
        name,
        rename_type,
        rename_field,
        remap,
        rewrite,
    } = decl;

    let actions = [
        rename_type.is_some(),
        rename_field.is_some(),
        remap.is_some(),
        rewrite.is_some(),
    ];
    if actions.iter().filter(|&&set| set).count() != 1 {
        return Err(ManifestError::Invalid(name));
    }

    if let Some(r) = rename_type {
        return Ok(Fixer::rename_type(name, version, TypeId::of(r.kind, r.from), r.to));
    }
    if let Some(r) = rename_field {
        let type_id = TypeId::of(r.kind, r.type_name);
        return Ok(Fixer::rename_field(name, version, type_id, &r.from, r.to)?);
    }
    if let Some(r) = remap {
        let type_id = TypeId::of(r.kind, r.type_name);
        return Ok(Fixer::remap(name, version, type_id, &r.field, r.table)?);
    }
    match rewrite {
        Some(r) => {
            let found = catalog
                .get(&r.using)
                .ok_or_else(|| ManifestError::UnknownRewrite {
                    fixer: name.clone(),
                    rewrite: r.using.clone(),
                })?;
            Ok(Fixer::rewrite_with(name, version, TypeId::of(r.kind, r.type_name), found))
        }
        None => Err(ManifestError::Invalid(name)),
    }
}
