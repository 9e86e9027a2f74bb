use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The category a record belongs to.
///
/// Renames never cross categories: a block and an item may share a name
/// and still be migrated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A block state (`Name` + `Properties`).
    Block,
    /// Data attached to a placed block.
    BlockEntity,
    /// A living or projectile entity.
    Entity,
    /// An item stack.
    Item,
    /// A biome identifier.
    Biome,
    /// Uncategorised records.
    Generic,
}

impl RecordKind {
    /// Key that holds the identifier of an embedded record of this kind.
    pub fn id_key(self) -> &'static str {
        match self {
            Self::Block => "Name",
            _ => "id",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::BlockEntity => "block_entity",
            Self::Entity => "entity",
            Self::Item => "item",
            Self::Biome => "biome",
            Self::Generic => "generic",
        }
    }
}

/// Identity of a record type: its category plus an exact, case-sensitive name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId {
    pub kind: RecordKind,
    pub name: String,
}

impl TypeId {
    /// An uncategorised type.
    pub fn new(name: impl Into<String>) -> Self {
        Self::of(RecordKind::Generic, name)
    }

    pub fn of(kind: RecordKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn block(name: impl Into<String>) -> Self {
        Self::of(RecordKind::Block, name)
    }

    pub fn block_entity(name: impl Into<String>) -> Self {
        Self::of(RecordKind::BlockEntity, name)
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::of(RecordKind::Entity, name)
    }

    pub fn item(name: impl Into<String>) -> Self {
        Self::of(RecordKind::Item, name)
    }

    pub fn biome(name: impl Into<String>) -> Self {
        Self::of(RecordKind::Biome, name)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.name)
    }
}

/// A persisted unit of state subject to migration.
///
/// `version` is the data version the record was last written against;
/// `None` marks legacy data written before stamps existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub type_id: TypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default)]
    pub data: Value,
}

impl Record {
    /// An unstamped record.
    pub fn new(type_id: TypeId, data: Value) -> Self {
        Self {
            type_id,
            version: None,
            data,
        }
    }

    /// A record stamped with `version`.
    pub fn versioned(type_id: TypeId, version: u32, data: Value) -> Self {
        Self {
            type_id,
            version: Some(version),
            data,
        }
    }

    /// Write the data version stamp.
    pub fn stamp(&mut self, version: u32) {
        self.version = Some(version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_ids_are_scoped_by_kind() {
        assert_ne!(
            TypeId::block("wilderwild:dry_sand"),
            TypeId::item("wilderwild:dry_sand")
        );
        assert_eq!(TypeId::new("a").kind, RecordKind::Generic);
        assert_eq!(
            TypeId::block_entity("wilderwild:stone_chest").to_string(),
            "block_entity/wilderwild:stone_chest"
        );
    }

    #[test]
    fn unstamped_record_omits_version() {
        let record = Record::new(TypeId::new("a"), json!({ "x": 5 }));
        let encoded = serde_json::to_value(&record).unwrap();
        assert_eq!(
            encoded,
            json!({ "type": { "kind": "generic", "name": "a" }, "data": { "x": 5 } })
        );

        let decoded: Record = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.version, None);
    }

    #[test]
    fn stamp_sets_version() {
        let mut record = Record::new(TypeId::item("wilderwild:algae"), json!({}));
        record.stamp(18);
        assert_eq!(record.version, Some(18));
    }
}
