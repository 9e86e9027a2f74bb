//! # wilderwild-datafix
//!
//! The save-data migration chain for Wilder Wild.
//!
//! Every released data version of the mod is declared here together with the
//! fixers that carry saved blocks, items, block entities, entities and biomes
//! forward to it. Worlds written by any earlier release load cleanly into the
//! current one.
//!
//! ## Quick Start
//!
//! ```
//! use datafix::Record;
//! use serde_json::json;
//! use wilderwild_datafix::{data_fixer, DATA_VERSION};
//!
//! let fixer = data_fixer().unwrap();
//! assert_eq!(fixer.current_version(), DATA_VERSION);
//!
//! let old: Record = serde_json::from_value(json!({
//!     "type": { "kind": "block", "name": "wilderwild:white_dandelion" },
//!     "version": 0,
//! }))
//! .unwrap();
//! let migrated = fixer.migrate_to_current(&old).unwrap();
//! assert_eq!(migrated.type_id.name, "wilderwild:seeding_dandelion");
//! ```
//!
//! Version 12 was never released, so there is no schema for it; records
//! stamped 12 are read with the version 11 schema.

mod fixes;
mod schemas;

use std::sync::OnceLock;

use datafix::{ConfigError, DataFixer, DataFixerBuilder, TypeId};
use tracing::info;

use crate::schemas::{biome, block, block_entity, entity, item, ww, NEMATOCYSTS};

/// The data version written by the current release.
pub const DATA_VERSION: u32 = 18;

/// The process-wide chain, built on first use.
///
/// Every caller after the first gets the same instance; a chain that failed
/// to build keeps failing with the same error.
pub fn data_fixer() -> Result<&'static DataFixer, ConfigError> {
    static DATA_FIXER: OnceLock<Result<DataFixer, ConfigError>> = OnceLock::new();
    DATA_FIXER
        .get_or_init(build_data_fixer)
        .as_ref()
        .map_err(Clone::clone)
}

/// Build a fresh chain. Most callers want [`data_fixer`].
pub fn build_data_fixer() -> Result<DataFixer, ConfigError> {
    info!(
        data_version = DATA_VERSION,
        "applying data fixes for Wilder Wild"
    );
    let mut builder = DataFixerBuilder::new(DATA_VERSION);

    builder.add_schema(0, schemas::v0()?)?;

    builder.add_schema(1, schemas::v1())?;
    rename_block(&mut builder, 1, "white_dandelion", "blooming_dandelion");
    rename_block(&mut builder, 1, "potted_white_dandelion", "potted_blooming_dandelion");

    builder.add_schema(2, schemas::v2())?;
    rename_block(&mut builder, 2, "blooming_dandelion", "seeding_dandelion");
    rename_block(&mut builder, 2, "potted_blooming_dandelion", "potted_seeding_dandelion");

    builder.add_schema(3, schemas::v3())?;
    rename_block(&mut builder, 3, "floating_moss", "algae");
    rename_item(&mut builder, 3, "floating_moss", "algae");

    builder.add_schema(4, schemas::v4())?;
    rename_block(&mut builder, 4, "test_1", "null_block");

    builder.add_schema(5, schemas::v5())?;
    rename_block(&mut builder, 5, "sculk_echoer", "null_block");
    rename_block(&mut builder, 5, "sculk_jaw", "null_block");

    builder.add_schema(6, schemas::v6())?;
    rename_block(&mut builder, 6, "baobab_sapling", "baobab_nut");
    rename_block(&mut builder, 6, "baobab_nut_sapling", "baobab_nut");
    rename_block(&mut builder, 6, "potted_baobab_sapling", "potted_baobab_nut");

    builder.add_schema(7, schemas::v7()?)?;
    rename_block(&mut builder, 7, "firefly_lantern", "display_lantern");
    rename_block(&mut builder, 7, "mesoglea", "blue_pearlescent_mesoglea");
    rename_item(&mut builder, 7, "mesoglea", "blue_pearlescent_mesoglea");

    builder.add_schema(8, schemas::v8()?)?;
    builder.rename_field(
        "display_lantern_rename_fix",
        8,
        block("display_lantern"),
        "Properties.light",
        "display_light",
    )?;

    builder.add_schema(9, schemas::v9()?)?;
    for name in NEMATOCYSTS {
        builder.rewrite(
            &format!("{name}_fix"),
            9,
            block(name),
            fixes::nematocyst_facing_to_multiface,
        );
    }

    builder.add_schema(10, schemas::v10())?;
    rename_block(&mut builder, 10, "palm_sapling", "coconut");

    // The state fix runs on both names so records renamed by the second
    // fixer are covered too.
    builder.add_schema(11, schemas::v11()?)?;
    builder.rename_field(
        "dry_sand_crackness_to_crackedness",
        11,
        block("dry_sand"),
        "Properties.crackness",
        "crackedness",
    )?;
    rename_block(&mut builder, 11, "dry_sand", "scorched_sand");
    rename_item(&mut builder, 11, "dry_sand", "scorched_sand");
    builder.rename_field(
        "scorched_sand_crackness_to_crackedness",
        11,
        block("scorched_sand"),
        "Properties.crackness",
        "crackedness",
    )?;

    builder.add_schema(13, schemas::v13())?;
    rename_block(&mut builder, 13, "palm_leaves", "palm_fronds");
    rename_item(&mut builder, 13, "palm_leaves", "palm_fronds");

    builder.add_schema(14, schemas::v14()?)?;
    builder.rewrite(
        "scorched_sand_integer_to_boolean",
        14,
        block("scorched_sand"),
        fixes::crackedness_to_cracked,
    );
    builder.rewrite(
        "scorched_red_sand_integer_to_boolean",
        14,
        block("scorched_red_sand"),
        fixes::crackedness_to_cracked,
    );

    builder.add_schema(15, schemas::v15()?)?;
    builder.rewrite(
        "osseous_sculk_axis_to_direction",
        15,
        block("osseous_sculk"),
        fixes::osseous_sculk_axis_to_facing,
    );

    builder.add_schema(16, schemas::v16())?;
    builder.rename_type(
        "Replace wilderwild:music_disc_back with minecraft:music_disc_5",
        16,
        item("music_disc_back"),
        "minecraft:music_disc_5",
    );
    builder.rename_type(
        "Replace wilderwild:music_disc_goathorn_symphony with minecraft:music_disc_otherside",
        16,
        item("music_disc_goathorn_symphony"),
        "minecraft:music_disc_otherside",
    );
    builder.rename_type(
        "Rename ancient_horn_projectile to ancient_horn_vibration",
        16,
        entity("ancient_horn_projectile"),
        ww("ancient_horn_vibration"),
    );

    builder.add_schema(17, schemas::v17())?;
    builder.rename_type(
        "Rename wilderwild:magma_caves to wilderwild:magmatic_caves",
        17,
        biome("magma_caves"),
        ww("magmatic_caves"),
    );

    builder.add_schema(18, schemas::v18()?)?;
    rename_block(&mut builder, 18, "stone_chest", "metal_chest");
    rename_item(&mut builder, 18, "stone_chest", "metal_chest");
    rename(
        &mut builder,
        "Rename stone chest to metal chest",
        18,
        block_entity("stone_chest"),
        "metal_chest",
    );

    let fixer = builder.build()?;
    info!("data fixes for Wilder Wild have been applied");
    Ok(fixer)
}

fn rename(builder: &mut DataFixerBuilder, name: &str, version: u32, from: TypeId, to: &str) {
    builder.rename_type(name, version, from, ww(to));
}

fn rename_block(builder: &mut DataFixerBuilder, version: u32, from: &str, to: &str) {
    let name = format!("Rename {from} to {to}");
    rename(builder, &name, version, block(from), to);
}

fn rename_item(builder: &mut DataFixerBuilder, version: u32, from: &str, to: &str) {
    let name = format!("Rename {from} item to {to}");
    rename(builder, &name, version, item(from), to);
}
