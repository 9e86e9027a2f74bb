use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::error::{ConfigError, MigrationError};
use crate::fixer::{FixContext, Fixer, FixerKind, Rename};
use crate::record::{Record, TypeId};
use crate::schema::{Schema, SchemaRegistry, TypeTemplate};
use crate::value::{self, FieldPath};

/// What to do with a record stamped newer than the running build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FutureVersionPolicy {
    /// Return the record untouched, keeping its stamp.
    #[default]
    PassThrough,
    /// Fail with [`MigrationError::FutureVersion`].
    Reject,
}

/// Configuration for the migration driver.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Handling of records from a newer release.
    pub future_versions: FutureVersionPolicy,
    /// Check each migrated record against its template and log mismatches.
    /// On by default in debug builds only.
    pub verify_output: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            future_versions: FutureVersionPolicy::default(),
            verify_output: cfg!(debug_assertions),
        }
    }
}

/// A place where a record's data disagrees with its template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeViolation {
    /// The record's type is not declared at that version.
    UnknownType(TypeId),
    /// The record carries a field its template does not declare.
    UndeclaredField(FieldPath),
}

/// Assembles schemas and fixers, then finalises them into a [`DataFixer`].
///
/// # Example
///
/// ```
/// use datafix::{DataFixerBuilder, Record, Schema, TypeId, TypeTemplate};
/// use serde_json::json;
///
/// let template = TypeTemplate::new().with_field("x").unwrap();
/// let mut builder = DataFixerBuilder::new(2);
/// builder.add_schema(0, Schema::new().with_type(TypeId::new("a"), template.clone())).unwrap();
/// builder.add_schema(1, Schema::new().with_type(TypeId::new("b"), template)).unwrap();
/// builder.add_schema(2, Schema::new()).unwrap();
/// builder.rename_type("a to b", 1, TypeId::new("a"), "b");
/// builder.rename_field("x to y", 2, TypeId::new("b"), "x", "y").unwrap();
/// let fixer = builder.build().unwrap();
///
/// let record = Record::versioned(TypeId::new("a"), 0, json!({ "x": 5 }));
/// let (migrated, version) = fixer.migrate(&record, 0, 2).unwrap();
/// assert_eq!(migrated.type_id, TypeId::new("b"));
/// assert_eq!(migrated.data, json!({ "y": 5 }));
/// assert_eq!(version, 2);
/// ```
#[derive(Debug)]
pub struct DataFixerBuilder {
    current_version: u32,
    registry: SchemaRegistry,
    fixers: Vec<Fixer>,
    config: MigrationConfig,
}

impl DataFixerBuilder {
    /// Start a chain whose newest schema must be `current_version`.
    pub fn new(current_version: u32) -> Self {
        Self {
            current_version,
            registry: SchemaRegistry::new(),
            fixers: Vec::new(),
            config: MigrationConfig::default(),
        }
    }

    /// Register a schema. Versions must be strictly increasing.
    pub fn add_schema(&mut self, version: u32, schema: Schema) -> Result<(), ConfigError> {
        self.registry.register_schema(version, schema)
    }

    /// Register a fixer. Within one version, fixers run in registration order.
    pub fn add_fixer(&mut self, fixer: Fixer) -> &mut Self {
        self.fixers.push(fixer);
        self
    }

    pub fn rename_type(
        &mut self,
        name: &str,
        version: u32,
        from: TypeId,
        to: impl Into<String>,
    ) -> &mut Self {
        self.add_fixer(Fixer::rename_type(name, version, from, to))
    }

    pub fn rename_field(
        &mut self,
        name: &str,
        version: u32,
        type_id: TypeId,
        from: &str,
        to: &str,
    ) -> Result<&mut Self, ConfigError> {
        let fixer = Fixer::rename_field(name, version, type_id, from, to)?;
        Ok(self.add_fixer(fixer))
    }

    pub fn remap_values(
        &mut self,
        name: &str,
        version: u32,
        type_id: TypeId,
        field: &str,
        table: Vec<(Value, Value)>,
    ) -> Result<&mut Self, ConfigError> {
        let fixer = Fixer::remap(name, version, type_id, field, table)?;
        Ok(self.add_fixer(fixer))
    }

    pub fn rewrite<F>(&mut self, name: &str, version: u32, type_id: TypeId, rewrite: F) -> &mut Self
    where
        F: Fn(&mut Value) -> Result<(), crate::FixError> + Send + Sync + 'static,
    {
        self.add_fixer(Fixer::rewrite(name, version, type_id, rewrite))
    }

    pub fn config(&mut self, config: MigrationConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Validate the chain and freeze it.
    pub fn build(self) -> Result<DataFixer, ConfigError> {
        let latest = self.registry.latest().ok_or(ConfigError::NoSchemas)?;
        if latest != self.current_version {
            return Err(ConfigError::VersionMismatch {
                declared: self.current_version,
                registered: latest,
            });
        }

        let mut fixers = self.fixers;
        fixers.sort_by_key(Fixer::version);
        validate_chain(&self.registry, &fixers)?;

        info!(
            current_version = self.current_version,
            schemas = self.registry.len(),
            fixers = fixers.len(),
            "data fixer chain finalised"
        );

        Ok(DataFixer {
            current_version: self.current_version,
            registry: self.registry,
            fixers,
            config: self.config,
        })
    }
}

/// Check every fixer against the schema it upgrades from.
///
/// Types renamed earlier in the same version count as known, so a fixer may
/// act on the new name right after the rename.
fn validate_chain(registry: &SchemaRegistry, fixers: &[Fixer]) -> Result<(), ConfigError> {
    for group in fixers.chunk_by(|a, b| a.version() == b.version()) {
        let version = group[0].version();
        let unbound = || ConfigError::UnboundFixer {
            name: group[0].name().to_string(),
            version,
        };
        let target = registry.schema(version).ok_or_else(unbound)?;
        let prior = registry.previous(version).ok_or_else(unbound)?;

        let mut known: BTreeMap<TypeId, TypeTemplate> = prior
            .types()
            .filter_map(|t| prior.template(t).map(|tpl| (t.clone(), tpl.clone())))
            .collect();

        for fixer in group {
            let type_id = fixer.target();
            let Some(template) = known.get(type_id).cloned() else {
                let (name, type_id, schema) =
                    (fixer.name().to_string(), type_id.clone(), prior.version());
                return Err(match fixer.kind() {
                    FixerKind::Rename(Rename::Type { .. }) => ConfigError::MissingPriorType {
                        fixer: name,
                        type_id,
                        schema,
                    },
                    _ => ConfigError::UnknownType {
                        fixer: name,
                        type_id,
                        schema,
                    },
                });
            };

            let field = match fixer.kind() {
                FixerKind::Rename(Rename::Type { from, to }) => {
                    known.insert(TypeId::of(from.kind, to.clone()), template);
                    continue;
                }
                FixerKind::Rename(Rename::Field { from, .. }) => from,
                FixerKind::ValueRemap(remap) => {
                    check_remap_table(fixer.name(), &remap.table)?;
                    &remap.field
                }
                FixerKind::StructuralRewrite(_) => continue,
            };

            let declared_later = target
                .template(type_id)
                .is_some_and(|t| t.covers(field));
            if !template.covers(field) && !declared_later {
                return Err(ConfigError::UnknownField {
                    fixer: fixer.name().to_string(),
                    type_id: type_id.clone(),
                    field: field.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// A remap must not feed its own output back into itself. Identity pairs
/// never change anything and are ignored.
fn check_remap_table(fixer: &str, table: &[(Value, Value)]) -> Result<(), ConfigError> {
    let moves = || table.iter().filter(|(before, after)| before != after);
    for (_, after) in moves() {
        if moves().any(|(before, _)| before == after) {
            return Err(ConfigError::NonIdempotentRemap {
                fixer: fixer.to_string(),
                value: after.to_string(),
            });
        }
    }
    Ok(())
}

/// An immutable, finalised migration chain.
///
/// Built once at start-up by [`DataFixerBuilder::build`] and shared freely
/// across threads afterwards: migrating touches no shared mutable state.
#[derive(Debug)]
pub struct DataFixer {
    current_version: u32,
    registry: SchemaRegistry,
    fixers: Vec<Fixer>,
    config: MigrationConfig,
}

impl DataFixer {
    /// The newest data version this chain produces.
    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Every fixer, in application order.
    pub fn fixers(&self) -> &[Fixer] {
        &self.fixers
    }

    /// The stamp to migrate `record` from. Unstamped records are treated as
    /// the oldest registered version, never as current.
    pub fn effective_version(&self, record: &Record) -> u32 {
        record
            .version
            .or_else(|| self.registry.oldest())
            .unwrap_or_default()
    }

    /// Check if data at `data_version` would be changed by migrating to current.
    pub fn needs_migration(&self, data_version: u32) -> bool {
        data_version < self.current_version
    }

    /// Fixers that run when migrating from `from` to `to`, in order.
    pub fn fixers_between(&self, from: u32, to: u32) -> &[Fixer] {
        if from >= to {
            return &[];
        }
        let start = self.fixers.partition_point(|f| f.version() <= from);
        let end = self.fixers.partition_point(|f| f.version() <= to);
        &self.fixers[start..end]
    }

    /// Migrate `record` from data version `from` to `to`.
    ///
    /// Returns the migrated record and the version it now conforms to. The
    /// input is never modified, so a failure leaves nothing half-migrated.
    /// Persisting the new stamp is the caller's job.
    pub fn migrate(
        &self,
        record: &Record,
        from: u32,
        to: u32,
    ) -> Result<(Record, u32), MigrationError> {
        if from >= to {
            if from > self.current_version
                && self.config.future_versions == FutureVersionPolicy::Reject
            {
                return Err(MigrationError::FutureVersion {
                    found: from,
                    current: self.current_version,
                });
            }
            return Ok((record.clone(), from));
        }

        let fixers = self.fixers_between(from, to);
        debug!(
            type_id = %record.type_id,
            from,
            to,
            fixers = fixers.len(),
            "migrating record"
        );

        let mut migrated = record.clone();
        for fixer in fixers {
            let version = fixer.version();
            // `build` guarantees both schemas exist for every fixer.
            let (Some(prior), Some(target)) =
                (self.registry.previous(version), self.registry.schema(version))
            else {
                continue;
            };
            trace!(fixer = fixer.name(), version, "applying fixer");
            let type_id = migrated.type_id.clone();
            fixer
                .apply(&mut migrated, FixContext { prior, target })
                .map_err(|reason| MigrationError::Failed {
                    fixer: fixer.name().to_string(),
                    type_id,
                    reason,
                })?;
        }

        if self.config.verify_output {
            for violation in self.verify(&migrated, to) {
                warn!(
                    type_id = %migrated.type_id,
                    version = to,
                    ?violation,
                    "migrated record does not match its schema"
                );
            }
        }

        Ok((migrated, to))
    }

    /// Migrate `record` from its effective version to current and stamp it.
    pub fn migrate_to_current(&self, record: &Record) -> Result<Record, MigrationError> {
        let from = self.effective_version(record);
        let (mut migrated, version) = self.migrate(record, from, self.current_version)?;
        migrated.stamp(version);
        Ok(migrated)
    }

    /// Compare `record` with its template at `version`. A type removed by
    /// `version` counts as unknown.
    pub fn verify(&self, record: &Record, version: u32) -> Vec<ShapeViolation> {
        let live = self
            .registry
            .schema_at(version)
            .and_then(|schema| schema.template(&record.type_id));
        let Some(template) = live else {
            return vec![ShapeViolation::UnknownType(record.type_id.clone())];
        };
        if template.is_open() {
            return Vec::new();
        }
        value::leaf_paths(&record.data)
            .into_iter()
            .filter(|path| !template.covers(path))
            .map(ShapeViolation::UndeclaredField)
            .collect()
    }
}
