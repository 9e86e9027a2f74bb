//! Block state rewrites that renames and remaps cannot express.
//!
//! Every rewrite works on the record's `Properties` map, where block states
//! are stored as strings. A record without the old state is left alone, so
//! running a rewrite twice is a no-op.

use datafix::FixError;
use serde_json::{Map, Value};

const DIRECTIONS: [&str; 6] = ["north", "east", "south", "west", "up", "down"];

fn properties(data: &mut Value) -> Option<&mut Map<String, Value>> {
    data.get_mut("Properties")?.as_object_mut()
}

fn flag(set: bool) -> Value {
    Value::from(if set { "true" } else { "false" })
}

/// Nematocysts became multiface blocks: the single `facing` state turns into
/// one boolean per direction, set for the face the block was attached to.
pub(crate) fn nematocyst_facing_to_multiface(data: &mut Value) -> Result<(), FixError> {
    let Some(props) = properties(data) else {
        return Ok(());
    };
    let Some(facing) = props.remove("facing") else {
        return Ok(());
    };
    let attached = facing
        .as_str()
        .filter(|dir| DIRECTIONS.contains(dir))
        .ok_or_else(|| FixError::unexpected("Properties.facing", &facing))?;

    for dir in DIRECTIONS {
        props.insert(dir.to_string(), flag(dir == attached));
    }
    Ok(())
}

/// Scorched sand lost its crack levels: any level above zero is cracked.
pub(crate) fn crackedness_to_cracked(data: &mut Value) -> Result<(), FixError> {
    let Some(props) = properties(data) else {
        return Ok(());
    };
    let Some(level) = props.remove("crackedness") else {
        return Ok(());
    };
    let parsed = match &level {
        Value::String(text) => text.parse::<u64>().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    let level = parsed.ok_or_else(|| FixError::unexpected("Properties.crackedness", &level))?;

    props.insert("cracked".to_string(), flag(level > 0));
    Ok(())
}

/// Osseous sculk went from an axis plus an `upside_down` flag to a facing.
pub(crate) fn osseous_sculk_axis_to_facing(data: &mut Value) -> Result<(), FixError> {
    let Some(props) = properties(data) else {
        return Ok(());
    };
    let Some(axis) = props.remove("axis") else {
        return Ok(());
    };
    let upside_down = props.remove("upside_down").is_some_and(|v| v == "true");

    let facing = match (axis.as_str(), upside_down) {
        (Some("y"), false) => "up",
        (Some("y"), true) => "down",
        (Some("x"), false) => "east",
        (Some("x"), true) => "west",
        (Some("z"), false) => "south",
        (Some("z"), true) => "north",
        _ => return Err(FixError::unexpected("Properties.axis", &axis)),
    };
    props.insert("facing".to_string(), Value::from(facing));
    Ok(())
}
