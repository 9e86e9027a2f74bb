//! Type declarations for each Wilder Wild data version.
//!
//! A schema only lists what changed at its version; everything else is
//! inherited from the one before.

use datafix::{ConfigError, RecordKind, Schema, TypeId, TypeTemplate};

pub(crate) fn ww(name: &str) -> String {
    format!("wilderwild:{name}")
}

pub(crate) fn block(name: &str) -> TypeId {
    TypeId::block(ww(name))
}

pub(crate) fn item(name: &str) -> TypeId {
    TypeId::item(ww(name))
}

pub(crate) fn block_entity(name: &str) -> TypeId {
    TypeId::block_entity(ww(name))
}

pub(crate) fn entity(name: &str) -> TypeId {
    TypeId::entity(ww(name))
}

pub(crate) fn biome(name: &str) -> TypeId {
    TypeId::biome(ww(name))
}

fn states(fields: &[&str]) -> Result<TypeTemplate, ConfigError> {
    let paths: Vec<String> = fields.iter().map(|f| format!("Properties.{f}")).collect();
    let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
    TypeTemplate::new().with_fields(&paths)
}

/// Where item stacks live in any block entity or entity, vanilla or not.
fn item_stacks(schema: Schema) -> Result<Schema, ConfigError> {
    let entity_paths = ["ArmorItems", "HandItems", "Inventory", "EnderItems", "Item"];
    entity_paths.iter().try_fold(
        schema.with_kind_reference(RecordKind::BlockEntity, "Items", RecordKind::Item)?,
        |schema, path| schema.with_kind_reference(RecordKind::Entity, path, RecordKind::Item),
    )
}

fn with_open(schema: Schema, types: impl IntoIterator<Item = TypeId>) -> Schema {
    types
        .into_iter()
        .fold(schema, |schema, id| schema.with_type(id, TypeTemplate::open()))
}

fn without(schema: Schema, types: impl IntoIterator<Item = TypeId>) -> Schema {
    types.into_iter().fold(schema, Schema::without_type)
}

pub(crate) const NEMATOCYSTS: [&str; 7] = [
    "blue_nematocyst",
    "blue_pearlescent_nematocyst",
    "lime_nematocyst",
    "pink_nematocyst",
    "purple_pearlescent_nematocyst",
    "red_nematocyst",
    "yellow_nematocyst",
];

/// Everything that existed before the first fix.
pub(crate) fn v0() -> Result<Schema, ConfigError> {
    let mut schema = with_open(
        item_stacks(Schema::new())?,
        [
            "white_dandelion",
            "potted_white_dandelion",
            "floating_moss",
            "test_1",
            "sculk_echoer",
            "sculk_jaw",
            "baobab_sapling",
            "baobab_nut_sapling",
            "potted_baobab_sapling",
            "firefly_lantern",
            "mesoglea",
            "palm_sapling",
            "palm_leaves",
        ]
        .map(block),
    );
    schema = with_open(
        schema,
        [
            "floating_moss",
            "mesoglea",
            "dry_sand",
            "palm_leaves",
            "music_disc_back",
            "music_disc_goathorn_symphony",
            "stone_chest",
        ]
        .map(item),
    );
    schema = with_open(
        schema,
        [
            "hanging_tendril",
            "scorched_block",
            "termite_mound",
            "geyser",
            "display_lantern",
            "stone_chest",
        ]
        .map(block_entity),
    );
    schema = with_open(
        schema,
        [
            "ancient_horn_projectile",
            "coconut",
            "chest_bubbler",
            "sculk_spreader",
            "jellyfish",
            "ostrich",
            "crab",
            "firefly",
            "scorched",
        ]
        .map(entity),
    );

    for name in NEMATOCYSTS {
        schema = schema.with_type(block(name), states(&["facing", "waterlogged"])?);
    }

    Ok(schema
        .with_type(block("dry_sand"), states(&["crackness"])?)
        .with_type(block("osseous_sculk"), states(&["axis", "upside_down", "height"])?)
        .with_type(block("stone_chest"), states(&["facing", "type", "waterlogged"])?)
        .with_type(
            entity("tumbleweed"),
            TypeTemplate::open().with_reference("Items", RecordKind::Item)?,
        )
        .with_type(biome("magma_caves"), TypeTemplate::open()))
}

pub(crate) fn v1() -> Schema {
    let schema = with_open(
        Schema::new(),
        ["blooming_dandelion", "potted_blooming_dandelion"].map(block),
    );
    without(schema, ["white_dandelion", "potted_white_dandelion"].map(block))
}

pub(crate) fn v2() -> Schema {
    let schema = with_open(
        Schema::new(),
        ["seeding_dandelion", "potted_seeding_dandelion"].map(block),
    );
    without(schema, ["blooming_dandelion", "potted_blooming_dandelion"].map(block))
}

pub(crate) fn v3() -> Schema {
    Schema::new()
        .with_type(block("algae"), TypeTemplate::open())
        .with_type(item("algae"), TypeTemplate::open())
        .without_type(block("floating_moss"))
        .without_type(item("floating_moss"))
}

pub(crate) fn v4() -> Schema {
    Schema::new()
        .with_type(block("null_block"), TypeTemplate::open())
        .without_type(block("test_1"))
}

pub(crate) fn v5() -> Schema {
    without(Schema::new(), ["sculk_echoer", "sculk_jaw"].map(block))
}

pub(crate) fn v6() -> Schema {
    let schema = with_open(Schema::new(), ["baobab_nut", "potted_baobab_nut"].map(block));
    without(
        schema,
        ["baobab_sapling", "baobab_nut_sapling", "potted_baobab_sapling"].map(block),
    )
}

pub(crate) fn v7() -> Result<Schema, ConfigError> {
    Ok(Schema::new()
        .with_type(
            block("display_lantern"),
            states(&["hanging", "light", "waterlogged"])?,
        )
        .with_type(block("blue_pearlescent_mesoglea"), TypeTemplate::open())
        .with_type(item("blue_pearlescent_mesoglea"), TypeTemplate::open())
        .without_type(block("firefly_lantern"))
        .without_type(block("mesoglea"))
        .without_type(item("mesoglea")))
}

pub(crate) fn v8() -> Result<Schema, ConfigError> {
    Ok(Schema::new().with_type(
        block("display_lantern"),
        states(&["hanging", "display_light", "waterlogged"])?,
    ))
}

pub(crate) fn v9() -> Result<Schema, ConfigError> {
    let multiface = states(&["north", "east", "south", "west", "up", "down", "waterlogged"])?;
    Ok(NEMATOCYSTS.iter().fold(Schema::new(), |schema, name| {
        schema.with_type(block(name), multiface.clone())
    }))
}

pub(crate) fn v10() -> Schema {
    Schema::new()
        .with_type(block("coconut"), TypeTemplate::open())
        .without_type(block("palm_sapling"))
}

pub(crate) fn v11() -> Result<Schema, ConfigError> {
    Ok(Schema::new()
        .with_type(block("scorched_sand"), states(&["crackedness"])?)
        .with_type(block("scorched_red_sand"), states(&["crackedness"])?)
        .with_type(item("scorched_sand"), TypeTemplate::open())
        .without_type(block("dry_sand"))
        .without_type(item("dry_sand")))
}

pub(crate) fn v13() -> Schema {
    Schema::new()
        .with_type(block("palm_fronds"), TypeTemplate::open())
        .with_type(item("palm_fronds"), TypeTemplate::open())
        .without_type(block("palm_leaves"))
        .without_type(item("palm_leaves"))
}

pub(crate) fn v14() -> Result<Schema, ConfigError> {
    Ok(Schema::new()
        .with_type(block("scorched_sand"), states(&["cracked"])?)
        .with_type(block("scorched_red_sand"), states(&["cracked"])?))
}

pub(crate) fn v15() -> Result<Schema, ConfigError> {
    Ok(Schema::new().with_type(block("osseous_sculk"), states(&["facing", "height"])?))
}

pub(crate) fn v16() -> Schema {
    Schema::new()
        .with_type(TypeId::item("minecraft:music_disc_5"), TypeTemplate::open())
        .with_type(TypeId::item("minecraft:music_disc_otherside"), TypeTemplate::open())
        .with_type(entity("ancient_horn_vibration"), TypeTemplate::open())
        .without_type(item("music_disc_back"))
        .without_type(item("music_disc_goathorn_symphony"))
        .without_type(entity("ancient_horn_projectile"))
}

pub(crate) fn v17() -> Schema {
    Schema::new()
        .with_type(biome("magmatic_caves"), TypeTemplate::open())
        .without_type(biome("magma_caves"))
}

pub(crate) fn v18() -> Result<Schema, ConfigError> {
    Ok(Schema::new()
        .with_type(block("metal_chest"), states(&["facing", "type", "waterlogged"])?)
        .with_type(item("metal_chest"), TypeTemplate::open())
        .with_type(block_entity("metal_chest"), TypeTemplate::open())
        .without_type(block("stone_chest"))
        .without_type(item("stone_chest"))
        .without_type(block_entity("stone_chest")))
}
