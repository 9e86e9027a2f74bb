//! Path utilities over the generic record tree.
//!
//! Records are plain [`serde_json::Value`] trees. Maps are addressed by
//! [`FieldPath`]s; lists and scalars are leaves as far as paths go.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// A dotted path of map keys, e.g. `Properties.light`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Build a path from its segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::InvalidPath(segments.join(".")));
        }
        Ok(Self(segments))
    }

    /// Parse a dotted path.
    pub fn parse(path: &str) -> Result<Self, ConfigError> {
        if path.is_empty() {
            return Err(ConfigError::InvalidPath(String::new()));
        }
        Self::from_segments(path.split('.'))
            .map_err(|_| ConfigError::InvalidPath(path.to_string()))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The final key.
    pub fn last(&self) -> &str {
        // Never empty, see `from_segments`.
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// The keys leading to [`last`](Self::last).
    pub fn parent(&self) -> &[String] {
        &self.0[..self.0.len() - 1]
    }

    /// True if `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

fn walk<'a>(value: &'a Value, keys: &[String]) -> Option<&'a Value> {
    keys.iter().try_fold(value, |node, key| node.as_object()?.get(key))
}

fn walk_mut<'a>(value: &'a mut Value, keys: &[String]) -> Option<&'a mut Value> {
    keys.iter()
        .try_fold(value, |node, key| node.as_object_mut()?.get_mut(key))
}

/// Look up the value at `path`.
pub fn get<'a>(value: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    walk(value, path.segments())
}

/// Mutable lookup of the value at `path`.
pub fn get_mut<'a>(value: &'a mut Value, path: &FieldPath) -> Option<&'a mut Value> {
    walk_mut(value, path.segments())
}

/// The map holding the final key of `path`, if every step is a map.
fn parent_map_mut<'a>(
    value: &'a mut Value,
    path: &FieldPath,
) -> Option<&'a mut Map<String, Value>> {
    walk_mut(value, path.parent())?.as_object_mut()
}

/// Rename the final key of `path` to `new_key`, keeping its value.
///
/// A missing source key is a no-op, which makes the rename safe to repeat.
/// An existing `new_key` is overwritten. Returns whether anything moved.
pub fn rename_key(value: &mut Value, path: &FieldPath, new_key: &str) -> bool {
    if path.last() == new_key {
        return false;
    }
    let Some(map) = parent_map_mut(value, path) else {
        return false;
    };
    match map.remove(path.last()) {
        Some(moved) => {
            map.insert(new_key.to_string(), moved);
            true
        }
        None => false,
    }
}

/// Replace the scalar at `path` using a `before -> after` table.
///
/// Values not in the table, non-scalars and absent fields are left alone.
pub fn replace_scalar(value: &mut Value, path: &FieldPath, table: &[(Value, Value)]) -> bool {
    let Some(slot) = get_mut(value, path) else {
        return false;
    };
    if slot.is_object() || slot.is_array() {
        return false;
    }
    match table.iter().find(|(before, _)| before == slot) {
        Some((_, after)) => {
            *slot = after.clone();
            true
        }
        None => false,
    }
}

/// Every path that reaches a non-map value or an empty map.
pub fn leaf_paths(value: &Value) -> Vec<FieldPath> {
    fn collect(map: &Map<String, Value>, prefix: &mut Vec<String>, out: &mut Vec<FieldPath>) {
        for (key, child) in map {
            prefix.push(key.clone());
            match child.as_object() {
                Some(inner) if !inner.is_empty() => collect(inner, prefix, out),
                _ => out.push(FieldPath(prefix.clone())),
            }
            prefix.pop();
        }
    }

    let mut out = Vec::new();
    if let Some(map) = value.as_object() {
        collect(map, &mut Vec::new(), &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse(".a").is_err());
        assert_eq!(path("Properties.light").segments(), ["Properties", "light"]);
    }

    #[test]
    fn get_follows_maps_only() {
        let v = json!({ "Properties": { "light": "3" }, "Items": [1, 2] });
        assert_eq!(get(&v, &path("Properties.light")), Some(&json!("3")));
        assert_eq!(get(&v, &path("Items.0")), None);
        assert_eq!(get(&v, &path("missing.key")), None);
    }

    #[test]
    fn rename_key_moves_value_and_is_repeatable() {
        let mut v = json!({ "Properties": { "light": "3", "waterlogged": "false" } });
        assert!(rename_key(&mut v, &path("Properties.light"), "display_light"));
        assert!(!rename_key(&mut v, &path("Properties.light"), "display_light"));
        assert_eq!(
            v,
            json!({ "Properties": { "display_light": "3", "waterlogged": "false" } })
        );
    }

    #[test]
    fn replace_scalar_uses_table() {
        let table = [(json!("0"), json!("false")), (json!("1"), json!("true"))];
        let mut v = json!({ "cracked": "1" });
        assert!(replace_scalar(&mut v, &path("cracked"), &table));
        assert_eq!(v, json!({ "cracked": "true" }));

        let mut untouched = json!({ "cracked": "7" });
        assert!(!replace_scalar(&mut untouched, &path("cracked"), &table));
        assert!(!replace_scalar(&mut untouched, &path("absent"), &table));
        assert_eq!(untouched, json!({ "cracked": "7" }));
    }

    #[test]
    fn leaf_paths_descend_into_maps() {
        let v = json!({ "a": { "b": 1, "c": {} }, "d": [ { "e": 1 } ] });
        let mut leaves: Vec<String> = leaf_paths(&v).iter().map(|p| p.to_string()).collect();
        leaves.sort();
        assert_eq!(leaves, ["a.b", "a.c", "d"]);
    }
}
