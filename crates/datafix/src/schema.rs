//! Schema versions and the registry that orders them.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ConfigError, SchemaError};
use crate::record::{RecordKind, TypeId};
use crate::value::FieldPath;

/// The recognised shape of one record type at one schema version.
///
/// `fields` lists known field paths. `references` marks subtrees that embed
/// identifiers of another kind (an item list inside a chest, for instance),
/// which type renames follow. An `open` template accepts any shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTemplate {
    fields: BTreeSet<FieldPath>,
    references: BTreeMap<FieldPath, RecordKind>,
    open: bool,
}

impl TypeTemplate {
    /// A template with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// A template that accepts any shape.
    pub fn open() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    pub fn with_field(mut self, path: &str) -> Result<Self, ConfigError> {
        self.fields.insert(FieldPath::parse(path)?);
        Ok(self)
    }

    pub fn with_fields(self, paths: &[&str]) -> Result<Self, ConfigError> {
        paths.iter().try_fold(self, |template, path| template.with_field(path))
    }

    /// Declare a field that holds embedded records or identifiers of `kind`.
    pub fn with_reference(mut self, path: &str, kind: RecordKind) -> Result<Self, ConfigError> {
        let path = FieldPath::parse(path)?;
        self.fields.insert(path.clone());
        self.references.insert(path, kind);
        Ok(self)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldPath> {
        self.fields.iter()
    }

    pub fn references(&self) -> impl Iterator<Item = (&FieldPath, RecordKind)> {
        self.references.iter().map(|(path, kind)| (path, *kind))
    }

    /// True if `path` is a declared field, lies inside one, or leads to one.
    pub fn covers(&self, path: &FieldPath) -> bool {
        self.open
            || self
                .fields
                .iter()
                .any(|field| field.starts_with(path) || path.starts_with(field))
    }
}

/// The types one schema version adds, redeclares or drops.
///
/// Anything not mentioned is inherited from the previous schema. Kind-wide
/// references apply to every record of that kind, declared type or not, so a
/// vanilla chest's item stacks follow item renames too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    types: BTreeMap<TypeId, TypeTemplate>,
    removed: BTreeSet<TypeId>,
    kind_references: BTreeMap<RecordKind, BTreeMap<FieldPath, RecordKind>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) a type.
    pub fn with_type(mut self, type_id: TypeId, template: TypeTemplate) -> Self {
        self.removed.remove(&type_id);
        self.types.insert(type_id, template);
        self
    }

    /// Drop a type inherited from earlier schemas.
    pub fn without_type(mut self, type_id: TypeId) -> Self {
        self.types.remove(&type_id);
        self.removed.insert(type_id);
        self
    }

    /// Every record of `kind` may embed records of `embedded` at `path`.
    pub fn with_kind_reference(
        mut self,
        kind: RecordKind,
        path: &str,
        embedded: RecordKind,
    ) -> Result<Self, ConfigError> {
        self.kind_references
            .entry(kind)
            .or_default()
            .insert(FieldPath::parse(path)?, embedded);
        Ok(self)
    }
}

/// A registered schema with its inherited types resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedSchema {
    version: u32,
    resolved: BTreeMap<TypeId, TypeTemplate>,
    retired: BTreeMap<TypeId, TypeTemplate>,
    kind_references: BTreeMap<RecordKind, BTreeMap<FieldPath, RecordKind>>,
}

impl VersionedSchema {
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Template of `type_id` at this version, inheritance included. Types
    /// removed at or before this version are not live.
    pub fn template(&self, type_id: &TypeId) -> Option<&TypeTemplate> {
        self.resolved.get(type_id)
    }

    /// Last template of a type removed at or before this version.
    pub fn retired(&self, type_id: &TypeId) -> Option<&TypeTemplate> {
        self.retired.get(type_id)
    }

    /// Paths of a `type_id` record that embed other records: those of its
    /// kind plus those its own template declares.
    pub fn references(&self, type_id: &TypeId) -> BTreeMap<&FieldPath, RecordKind> {
        let by_kind = self
            .kind_references
            .get(&type_id.kind)
            .into_iter()
            .flatten()
            .map(|(path, kind)| (path, *kind));
        let declared = self
            .template(type_id)
            .into_iter()
            .flat_map(|template| template.references());
        by_kind.chain(declared).collect()
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeId> {
        self.resolved.keys()
    }
}

/// Ordered, append-only collection of schema versions.
///
/// # Example
///
/// ```
/// use datafix::{Schema, SchemaRegistry, TypeId, TypeTemplate};
///
/// let mut registry = SchemaRegistry::new();
/// registry
///     .register_schema(0, Schema::new().with_type(TypeId::new("a"), TypeTemplate::open()))
///     .unwrap();
/// registry.register_schema(2, Schema::new()).unwrap();
///
/// // v1 resolves to the nearest schema below it.
/// assert_eq!(registry.schema_at(1).unwrap().version(), 0);
/// // v2 inherits `a` from v0.
/// assert!(registry.type_template(2, &TypeId::new("a")).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<VersionedSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a schema. Versions must be strictly increasing.
    pub fn register_schema(&mut self, version: u32, schema: Schema) -> Result<(), ConfigError> {
        if let Some(latest) = self.latest() {
            if version == latest {
                return Err(ConfigError::DuplicateVersion(version));
            }
            if version < latest {
                if self.schemas.iter().any(|s| s.version == version) {
                    return Err(ConfigError::DuplicateVersion(version));
                }
                return Err(ConfigError::OutOfOrder { version, latest });
            }
        }

        let (mut resolved, mut retired, mut kind_references) = self
            .schemas
            .last()
            .map(|prev| {
                (
                    prev.resolved.clone(),
                    prev.retired.clone(),
                    prev.kind_references.clone(),
                )
            })
            .unwrap_or_default();
        for type_id in schema.removed {
            if let Some(template) = resolved.remove(&type_id) {
                retired.insert(type_id, template);
            }
        }
        for (type_id, template) in schema.types {
            retired.remove(&type_id);
            resolved.insert(type_id, template);
        }
        for (kind, paths) in schema.kind_references {
            kind_references.entry(kind).or_default().extend(paths);
        }

        self.schemas.push(VersionedSchema {
            version,
            resolved,
            retired,
            kind_references,
        });
        Ok(())
    }

    /// The nearest registered schema at or below `version`.
    pub fn schema_at(&self, version: u32) -> Option<&VersionedSchema> {
        let idx = self.schemas.partition_point(|s| s.version <= version);
        idx.checked_sub(1).map(|i| &self.schemas[i])
    }

    /// The schema registered exactly at `version`.
    pub fn schema(&self, version: u32) -> Option<&VersionedSchema> {
        self.schemas
            .binary_search_by_key(&version, |s| s.version)
            .ok()
            .map(|i| &self.schemas[i])
    }

    /// The registered schema immediately before `version`.
    pub fn previous(&self, version: u32) -> Option<&VersionedSchema> {
        self.schema_at(version.checked_sub(1)?)
    }

    /// Template of `type_id` as known at schema `version`.
    ///
    /// Fails only if no schema at or below `version` ever declared the type.
    /// A type removed since resolves to the template it had when removed.
    pub fn type_template(
        &self,
        version: u32,
        type_id: &TypeId,
    ) -> Result<&TypeTemplate, SchemaError> {
        let schema = self.schema_at(version).ok_or(SchemaError::NoSchema(version))?;
        schema
            .template(type_id)
            .or_else(|| schema.retired(type_id))
            .ok_or_else(|| SchemaError::UnknownType {
                type_id: type_id.clone(),
                version,
            })
    }

    pub fn oldest(&self) -> Option<u32> {
        self.schemas.first().map(|s| s.version)
    }

    pub fn latest(&self) -> Option<u32> {
        self.schemas.last().map(|s| s.version)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(versions: &[u32]) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        for &v in versions {
            registry.register_schema(v, Schema::new()).unwrap();
        }
        registry
    }

    #[test]
    fn rejects_duplicate_version() {
        let mut registry = registry(&[0, 1, 2]);
        assert_eq!(
            registry.register_schema(2, Schema::new()),
            Err(ConfigError::DuplicateVersion(2))
        );
        assert_eq!(
            registry.register_schema(1, Schema::new()),
            Err(ConfigError::DuplicateVersion(1))
        );
    }

    #[test]
    fn rejects_out_of_order_version() {
        let mut registry = registry(&[0, 5]);
        assert_eq!(
            registry.register_schema(3, Schema::new()),
            Err(ConfigError::OutOfOrder {
                version: 3,
                latest: 5
            })
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn schema_at_picks_nearest_below() {
        let registry = registry(&[0, 11, 13]);
        assert_eq!(registry.schema_at(12).unwrap().version(), 11);
        assert_eq!(registry.schema_at(13).unwrap().version(), 13);
        assert_eq!(registry.schema_at(99).unwrap().version(), 13);

        assert!(self::registry(&[3]).schema_at(2).is_none());
    }

    #[test]
    fn previous_skips_gaps() {
        let registry = registry(&[0, 11, 13]);
        assert_eq!(registry.previous(13).unwrap().version(), 11);
        assert_eq!(registry.previous(11).unwrap().version(), 0);
        assert!(registry.previous(0).is_none());
    }

    #[test]
    fn types_are_inherited_until_removed() {
        let a = TypeId::block("a");
        let mut registry = SchemaRegistry::new();
        registry
            .register_schema(0, Schema::new().with_type(a.clone(), TypeTemplate::open()))
            .unwrap();
        registry.register_schema(1, Schema::new()).unwrap();
        registry
            .register_schema(2, Schema::new().without_type(a.clone()))
            .unwrap();

        assert!(registry.schema(1).unwrap().template(&a).is_some());
        assert!(registry.schema(2).unwrap().template(&a).is_none());
        assert_eq!(
            registry.type_template(0, &TypeId::item("a")),
            Err(SchemaError::UnknownType {
                type_id: TypeId::item("a"),
                version: 0
            })
        );
    }

    #[test]
    fn removed_types_still_resolve() {
        let a = TypeId::block("a");
        let template = TypeTemplate::new().with_field("Properties.light").unwrap();
        let mut registry = SchemaRegistry::new();
        registry
            .register_schema(0, Schema::new().with_type(a.clone(), template.clone()))
            .unwrap();
        registry
            .register_schema(1, Schema::new().without_type(a.clone()))
            .unwrap();
        registry.register_schema(2, Schema::new()).unwrap();

        assert_eq!(registry.type_template(2, &a), Ok(&template));
        assert_eq!(registry.schema(2).unwrap().retired(&a), Some(&template));

        registry
            .register_schema(3, Schema::new().with_type(a.clone(), TypeTemplate::open()))
            .unwrap();
        assert!(registry.schema(3).unwrap().retired(&a).is_none());
        assert!(registry.type_template(3, &a).unwrap().is_open());
    }

    #[test]
    fn kind_references_apply_to_undeclared_types() {
        let mut registry = SchemaRegistry::new();
        let chest = TypeId::block_entity("wilderwild:stone_chest");
        registry
            .register_schema(
                0,
                Schema::new()
                    .with_kind_reference(RecordKind::BlockEntity, "Items", RecordKind::Item)
                    .unwrap()
                    .with_type(
                        chest.clone(),
                        TypeTemplate::open()
                            .with_reference("Book", RecordKind::Item)
                            .unwrap(),
                    ),
            )
            .unwrap();
        registry.register_schema(1, Schema::new()).unwrap();

        let schema = registry.schema(1).unwrap();
        let path = |s: &str| FieldPath::parse(s).unwrap();
        let vanilla: Vec<_> = schema
            .references(&TypeId::block_entity("minecraft:chest"))
            .into_iter()
            .map(|(p, k)| (p.clone(), k))
            .collect();
        assert_eq!(vanilla, [(path("Items"), RecordKind::Item)]);
        assert_eq!(schema.references(&chest).len(), 2);
        assert!(schema.references(&TypeId::entity("minecraft:pig")).is_empty());
    }

    #[test]
    fn template_covers_declared_paths() {
        let template = TypeTemplate::new()
            .with_fields(&["Properties.light", "waterlogged"])
            .unwrap()
            .with_reference("Items", RecordKind::Item)
            .unwrap();

        let path = |s: &str| FieldPath::parse(s).unwrap();
        assert!(template.covers(&path("Properties")));
        assert!(template.covers(&path("Properties.light")));
        assert!(template.covers(&path("Items")));
        assert!(!template.covers(&path("Properties.display_light")));
        assert!(!template.covers(&path("CustomName")));
        assert!(TypeTemplate::open().covers(&path("anything.at.all")));
        assert_eq!(template.references().count(), 1);
    }
}
