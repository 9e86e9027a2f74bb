use datafix::{DataFixer, MigrationError, Record, TypeId};
use serde_json::{json, Value};
use wilderwild_datafix::{data_fixer, DATA_VERSION};

fn fixer() -> &'static DataFixer {
    data_fixer().unwrap()
}

fn ww(name: &str) -> String {
    format!("wilderwild:{name}")
}

fn upgrade(type_id: TypeId, version: u32, data: Value) -> Record {
    fixer()
        .migrate_to_current(&Record::versioned(type_id, version, data))
        .unwrap()
}

#[test]
fn dandelions_chain_through_both_renames() {
    for (old, new) in [
        ("white_dandelion", "seeding_dandelion"),
        ("potted_white_dandelion", "potted_seeding_dandelion"),
    ] {
        let migrated = upgrade(TypeId::block(ww(old)), 0, json!({}));
        assert_eq!(migrated.type_id, TypeId::block(ww(new)));
        assert_eq!(migrated.version, Some(DATA_VERSION));
    }
}

#[test]
fn simple_block_renames() {
    let cases = [
        (0, "floating_moss", "algae"),
        (3, "test_1", "null_block"),
        (4, "sculk_echoer", "null_block"),
        (4, "sculk_jaw", "null_block"),
        (5, "baobab_sapling", "baobab_nut"),
        (5, "baobab_nut_sapling", "baobab_nut"),
        (5, "potted_baobab_sapling", "potted_baobab_nut"),
        (6, "mesoglea", "blue_pearlescent_mesoglea"),
        (9, "palm_sapling", "coconut"),
        (12, "palm_leaves", "palm_fronds"),
    ];
    for (version, old, new) in cases {
        let migrated = upgrade(TypeId::block(ww(old)), version, json!({}));
        assert_eq!(migrated.type_id, TypeId::block(ww(new)), "{old} at v{version}");
    }
}

#[test]
fn item_renames_keep_their_kind() {
    let cases = [
        ("floating_moss", ww("algae")),
        ("mesoglea", ww("blue_pearlescent_mesoglea")),
        ("dry_sand", ww("scorched_sand")),
        ("palm_leaves", ww("palm_fronds")),
        ("music_disc_back", "minecraft:music_disc_5".to_string()),
        ("music_disc_goathorn_symphony", "minecraft:music_disc_otherside".to_string()),
        ("stone_chest", ww("metal_chest")),
    ];
    for (old, new) in cases {
        let migrated = upgrade(TypeId::item(ww(old)), 0, json!({ "Count": 1 }));
        assert_eq!(migrated.type_id, TypeId::item(new));
        assert_eq!(migrated.data, json!({ "Count": 1 }));
    }
}

#[test]
fn firefly_lantern_light_becomes_display_light() {
    let migrated = upgrade(
        TypeId::block(ww("firefly_lantern")),
        6,
        json!({ "Properties": { "hanging": "true", "light": "7", "waterlogged": "false" } }),
    );
    assert_eq!(migrated.type_id, TypeId::block(ww("display_lantern")));
    assert_eq!(
        migrated.data,
        json!({ "Properties": { "hanging": "true", "display_light": "7", "waterlogged": "false" } })
    );
    assert!(fixer().verify(&migrated, DATA_VERSION).is_empty());
}

#[test]
fn nematocysts_become_multiface() {
    for color in [
        "blue",
        "blue_pearlescent",
        "lime",
        "pink",
        "purple_pearlescent",
        "red",
        "yellow",
    ] {
        let id = TypeId::block(ww(&format!("{color}_nematocyst")));
        let migrated = upgrade(
            id.clone(),
            8,
            json!({ "Properties": { "facing": "west", "waterlogged": "false" } }),
        );
        assert_eq!(migrated.type_id, id);
        let props = &migrated.data["Properties"];
        assert_eq!(props["west"], json!("true"));
        assert_eq!(props["up"], json!("false"));
        assert!(props.get("facing").is_none());
    }
}

#[test]
fn dry_sand_becomes_cracked_scorched_sand() {
    let migrated = upgrade(
        TypeId::block(ww("dry_sand")),
        10,
        json!({ "Properties": { "crackness": "1" } }),
    );
    assert_eq!(migrated.type_id, TypeId::block(ww("scorched_sand")));
    assert_eq!(migrated.data, json!({ "Properties": { "cracked": "true" } }));

    let smooth = upgrade(
        TypeId::block(ww("dry_sand")),
        0,
        json!({ "Properties": { "crackness": "0" } }),
    );
    assert_eq!(smooth.data, json!({ "Properties": { "cracked": "false" } }));
}

#[test]
fn scorched_sand_stamped_before_the_rename_fix() {
    // Written by a build that already knew scorched_sand but still used crackness.
    let (migrated, version) = fixer()
        .migrate(
            &Record::versioned(
                TypeId::block(ww("scorched_sand")),
                10,
                json!({ "Properties": { "crackness": "2" } }),
            ),
            10,
            11,
        )
        .unwrap();
    assert_eq!(version, 11);
    assert_eq!(migrated.data, json!({ "Properties": { "crackedness": "2" } }));
}

#[test]
fn scorched_red_sand_integer_to_boolean() {
    let migrated = upgrade(
        TypeId::block(ww("scorched_red_sand")),
        13,
        json!({ "Properties": { "crackedness": "0" } }),
    );
    assert_eq!(migrated.data, json!({ "Properties": { "cracked": "false" } }));
}

#[test]
fn osseous_sculk_axis_to_facing() {
    let migrated = upgrade(
        TypeId::block(ww("osseous_sculk")),
        14,
        json!({ "Properties": { "axis": "y", "upside_down": "true", "height": "0" } }),
    );
    assert_eq!(
        migrated.data,
        json!({ "Properties": { "facing": "down", "height": "0" } })
    );
}

#[test]
fn ancient_horn_projectile_becomes_vibration() {
    let migrated = upgrade(
        TypeId::entity(ww("ancient_horn_projectile")),
        15,
        json!({ "Motion": [0.0, 1.0, 0.0] }),
    );
    assert_eq!(migrated.type_id, TypeId::entity(ww("ancient_horn_vibration")));
}

#[test]
fn magma_caves_biome_is_renamed() {
    let migrated = upgrade(TypeId::biome(ww("magma_caves")), 16, json!({}));
    assert_eq!(migrated.type_id, TypeId::biome(ww("magmatic_caves")));
}

#[test]
fn stone_chest_contents_follow_item_renames() {
    let migrated = upgrade(
        TypeId::block_entity(ww("stone_chest")),
        0,
        json!({ "Items": [
            { "id": "wilderwild:floating_moss", "Count": 12, "Slot": 0 },
            { "id": "wilderwild:music_disc_back", "Count": 1, "Slot": 1 },
            { "id": "minecraft:stone", "Count": 64, "Slot": 2 },
        ] }),
    );
    assert_eq!(migrated.type_id, TypeId::block_entity(ww("metal_chest")));
    assert_eq!(
        migrated.data["Items"],
        json!([
            { "id": "wilderwild:algae", "Count": 12, "Slot": 0 },
            { "id": "minecraft:music_disc_5", "Count": 1, "Slot": 1 },
            { "id": "minecraft:stone", "Count": 64, "Slot": 2 },
        ])
    );
}

#[test]
fn equipped_mobs_follow_item_renames() {
    let migrated = upgrade(
        TypeId::entity(ww("crab")),
        2,
        json!({
            "HandItems": [{ "id": "wilderwild:mesoglea", "Count": 1 }, {}],
            "ArmorItems": [{}, {}, {}, {}],
        }),
    );
    assert_eq!(
        migrated.data["HandItems"][0]["id"],
        json!("wilderwild:blue_pearlescent_mesoglea")
    );
}

#[test]
fn vanilla_containers_follow_item_renames() {
    let chest = upgrade(
        TypeId::block_entity("minecraft:chest"),
        0,
        json!({ "Items": [
            { "id": "wilderwild:floating_moss", "Count": 3, "Slot": 0 },
            { "id": "wilderwild:dry_sand", "Count": 64, "Slot": 1 },
            { "id": "wilderwild:stone_chest", "Count": 1, "Slot": 2 },
        ] }),
    );
    assert_eq!(chest.type_id, TypeId::block_entity("minecraft:chest"));
    assert_eq!(
        chest.data["Items"],
        json!([
            { "id": "wilderwild:algae", "Count": 3, "Slot": 0 },
            { "id": "wilderwild:scorched_sand", "Count": 64, "Slot": 1 },
            { "id": "wilderwild:metal_chest", "Count": 1, "Slot": 2 },
        ])
    );
}

#[test]
fn vanilla_entities_follow_item_renames() {
    let player = upgrade(
        TypeId::entity("minecraft:player"),
        15,
        json!({
            "Inventory": [{ "id": "wilderwild:music_disc_back", "Count": 1, "Slot": 9 }],
            "EnderItems": [{ "id": "wilderwild:music_disc_goathorn_symphony", "Count": 1 }],
        }),
    );
    assert_eq!(player.data["Inventory"][0]["id"], json!("minecraft:music_disc_5"));
    assert_eq!(
        player.data["EnderItems"][0]["id"],
        json!("minecraft:music_disc_otherside")
    );

    let zombie = upgrade(
        TypeId::entity("minecraft:zombie"),
        12,
        json!({ "HandItems": [{ "id": "wilderwild:palm_leaves", "Count": 1 }, {}] }),
    );
    assert_eq!(zombie.data["HandItems"][0]["id"], json!("wilderwild:palm_fronds"));

    let dropped = upgrade(
        TypeId::entity("minecraft:item"),
        2,
        json!({ "Item": { "id": "wilderwild:floating_moss", "Count": 5 } }),
    );
    assert_eq!(dropped.data["Item"]["id"], json!("wilderwild:algae"));
}

#[test]
fn renamed_away_types_keep_their_template() {
    let registry = fixer().registry();
    let dandelion = TypeId::block(ww("white_dandelion"));
    assert!(registry.type_template(2, &dandelion).is_ok());
    assert!(registry.schema_at(2).unwrap().template(&dandelion).is_none());
    assert!(registry.type_template(DATA_VERSION, &TypeId::block(ww("stone_chest"))).is_ok());
}

#[test]
fn tumbleweed_held_item_is_renamed() {
    let migrated = upgrade(
        TypeId::entity(ww("tumbleweed")),
        12,
        json!({ "Items": { "id": "wilderwild:palm_leaves", "Count": 1 } }),
    );
    assert_eq!(migrated.data["Items"]["id"], json!("wilderwild:palm_fronds"));
}

#[test]
fn version_12_records_take_only_later_fixes() {
    let fixer = fixer();
    let names: Vec<&str> = fixer.fixers_between(12, 13).iter().map(|f| f.name()).collect();
    assert_eq!(
        names,
        ["Rename palm_leaves to palm_fronds", "Rename palm_leaves item to palm_fronds"]
    );
}

#[test]
fn current_records_are_untouched() {
    let record = Record::versioned(
        TypeId::block(ww("metal_chest")),
        DATA_VERSION,
        json!({ "Properties": { "facing": "north", "type": "single", "waterlogged": "false" } }),
    );
    assert_eq!(fixer().migrate_to_current(&record).unwrap(), record);
}

#[test]
fn bad_block_state_names_the_fixer() {
    let record = Record::versioned(
        TypeId::block(ww("osseous_sculk")),
        14,
        json!({ "Properties": { "axis": "w" } }),
    );
    match fixer().migrate_to_current(&record) {
        Err(MigrationError::Failed { fixer, type_id, .. }) => {
            assert_eq!(fixer, "osseous_sculk_axis_to_direction");
            assert_eq!(type_id, TypeId::block(ww("osseous_sculk")));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn unstamped_legacy_block_gets_every_fix() {
    let legacy = Record::new(
        TypeId::block(ww("firefly_lantern")),
        json!({ "Properties": { "light": "3" } }),
    );
    let migrated = fixer().migrate_to_current(&legacy).unwrap();
    assert_eq!(migrated.type_id, TypeId::block(ww("display_lantern")));
    assert_eq!(migrated.data["Properties"]["display_light"], json!("3"));
}
