//! The four category pipelines, parameterized over one shared engine:
//! load, segment, extract, (group), price, deduplicate, write.
//!
//! Each pipeline is a pure function over the line sequence and the price
//! table; the only mutable state is the per-run tracker and, for weapons,
//! the enchantment accumulator.

use crate::dedupe::Tracker;
use crate::enchant::{is_excluded_weapon, match_enchantment, EnchantmentGroups};
use crate::error::Result;
use crate::extract::{
    extract_attunement, extract_class_recommendations, extract_rarity, extract_staff_description,
    extract_wand_description, extract_weapon_block, extract_wondrous_description,
    find_wondrous_category, strip_legacy_prefix,
};
use crate::file_utils::{read_utf8_file, write_json_file};
use crate::models::{ItemRecord, ItemType, Rarity};
use crate::price::{resolve_price, PriceTable};
use crate::segment::{
    dense_lines, match_start, split_weapon_entries, trimmed_lines, STAFF_START_RULES,
    WAND_START_RULES, WONDROUS_START_RULES,
};
use std::path::Path;
use tracing::{error, info};

/// Parse one category from the raw dump text.
pub fn parse_category(item_type: ItemType, raw: &str, table: &PriceTable) -> Vec<ItemRecord> {
    match item_type {
        ItemType::Weapon => parse_weapons(raw, table),
        ItemType::Wand => parse_wands(raw, table),
        ItemType::Staff => parse_staffs(raw, table),
        ItemType::WondrousItem => parse_wondrous(raw, table),
    }
}

/// Run a full category pipeline over files: read the dump, load the price
/// table, parse, and write the JSON array.
///
/// A missing or unreadable input degrades to an empty result set instead
/// of failing the run; nothing is written in that case.
pub fn run_category(
    item_type: ItemType,
    input: &Path,
    price_table: &Path,
    output: &Path,
) -> Result<Vec<ItemRecord>> {
    let raw = match read_utf8_file(input) {
        Ok(raw) => raw,
        Err(err) => {
            error!("Could not read {:?}: {}", input, err);
            return Ok(Vec::new());
        }
    };
    let table = PriceTable::load(price_table);
    let records = parse_category(item_type, &raw, &table);
    write_json_file(output, &records)?;
    info!(
        "Wrote {} {} records to {:?}",
        records.len(),
        item_type,
        output
    );
    Ok(records)
}

fn parse_weapons(raw: &str, table: &PriceTable) -> Vec<ItemRecord> {
    let mut tracker = Tracker::new(false);
    let mut groups = EnchantmentGroups::new();

    for block in split_weapon_entries(raw) {
        let Some(fields) = extract_weapon_block(&block) else {
            continue;
        };
        let (name, is_legacy) = strip_legacy_prefix(&fields.name);
        if name.is_empty() || is_excluded_weapon(&name) {
            continue;
        }

        let rarity = fields.rarity.unwrap_or(Rarity::Rare);
        let mut record = ItemRecord::new(name.clone(), ItemType::Weapon, rarity);
        record.description = fields.description;
        record.attunement = fields.attunement;
        if !fields.classes.is_empty() {
            record.class_recommendations = Some(fields.classes);
        }
        record.weight = fields.weight;
        record.price = resolve_price(&name, ItemType::Weapon, rarity, table);

        match match_enchantment(&name) {
            Some(matched) => groups.add(matched, record),
            None => tracker.insert(record, is_legacy),
        }
    }

    let mut records = tracker.into_records();
    records.extend(groups.into_records());
    records
}

fn parse_wands(raw: &str, table: &PriceTable) -> Vec<ItemRecord> {
    let lines = dense_lines(raw);
    let mut tracker = Tracker::new(false);

    let mut index = 0;
    while index < lines.len() {
        if match_start(WAND_START_RULES, &lines, index).is_none() {
            index += 1;
            continue;
        }
        match extract_wand_entry(&lines, index, table) {
            Some((record, is_legacy, consumed_to)) => {
                tracker.insert(record, is_legacy);
                index = consumed_to.max(index + 1);
            }
            None => index += 1,
        }
    }

    tracker.into_records()
}

/// Extract one wand entry starting at its name line. Returns the record,
/// its legacy flag, and the index after the consumed lines.
fn extract_wand_entry(
    lines: &[String],
    start: usize,
    table: &PriceTable,
) -> Option<(ItemRecord, bool, usize)> {
    let name = lines[start].clone();
    let mut index = start + 1;

    let is_legacy = lines.get(index).map(String::as_str) == Some("LegacyWand");
    if matches!(
        lines.get(index).map(String::as_str),
        Some("Wand") | Some("LegacyWand") | Some("Legacy Wand")
    ) {
        index += 1;
    }
    if lines.get(index).map(String::as_str) == Some("Add") {
        index += 1;
    }

    let category = lines.get(index)?;
    if !category.contains("Wand,") && !category.contains("Legacy \u{2022}") {
        return None;
    }
    index += 1;

    let rarity = extract_rarity(category).unwrap_or(Rarity::Rare);
    let attunement = extract_attunement(category);
    let classes = extract_class_recommendations(category);

    // A leading price line is scaffolding, not description.
    if lines
        .get(index)
        .map(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(false)
    {
        index += 1;
    }

    let (description, consumed_to) = extract_wand_description(lines, index);

    let mut record = ItemRecord::new(name.clone(), ItemType::Wand, rarity);
    record.description = description;
    record.attunement = attunement;
    if !classes.is_empty() {
        record.class_recommendations = Some(classes);
    }
    record.price = resolve_price(&name, ItemType::Wand, rarity, table);

    Some((record, is_legacy, consumed_to))
}

fn parse_staffs(raw: &str, table: &PriceTable) -> Vec<ItemRecord> {
    let lines = trimmed_lines(raw);
    let mut tracker = Tracker::new(false);

    let mut index = 0;
    while index < lines.len() {
        if match_start(STAFF_START_RULES, &lines, index).is_none() || lines[index].is_empty() {
            index += 1;
            continue;
        }

        let name = lines[index].clone();
        let category = &lines[index + 3];
        // Staffs with no rarity signal are rejected outright.
        let Some(rarity) = extract_rarity(category) else {
            index += 1;
            continue;
        };
        let is_legacy = category.contains("Legacy");

        let attunement = extract_attunement(category);
        let classes = extract_class_recommendations(category);
        let (description, consumed_to) = extract_staff_description(&lines, index + 4);

        let mut record = ItemRecord::new(name.clone(), ItemType::Staff, rarity);
        record.description = description;
        record.attunement = attunement;
        if !classes.is_empty() {
            record.class_recommendations = Some(classes);
        }
        record.price = resolve_price(&name, ItemType::Staff, rarity, table);

        tracker.insert(record, is_legacy);
        index = consumed_to.max(index + 4);
    }

    tracker.into_records()
}

fn parse_wondrous(raw: &str, table: &PriceTable) -> Vec<ItemRecord> {
    let lines = trimmed_lines(raw);
    let mut tracker = Tracker::new(true);

    let mut index = 0;
    while index < lines.len() {
        if match_start(WONDROUS_START_RULES, &lines, index).is_none() {
            index += 1;
            continue;
        }

        let (name, is_legacy) = strip_legacy_prefix(&lines[index]);
        if name.is_empty() {
            index += 1;
            continue;
        }

        let (category, category_index) = find_wondrous_category(&lines, index);
        let rarity = extract_rarity(&category).unwrap_or(Rarity::Rare);
        let attunement = extract_attunement(&category);
        let classes = extract_class_recommendations(&category);
        let description = extract_wondrous_description(&lines, category_index);

        let mut record = ItemRecord::new(name.clone(), ItemType::WondrousItem, rarity);
        record.description = description;
        record.attunement = attunement;
        if !classes.is_empty() {
            record.class_recommendations = Some(classes);
        }
        record.price = resolve_price(&name, ItemType::WondrousItem, rarity, table);

        tracker.insert(record, is_legacy);

        // Resume after this entry's closing marker.
        let mut advance = index + 1;
        for (k, line) in lines.iter().enumerate().skip(index + 1) {
            if line.starts_with("Amount to add") || line.starts_with("Add Item") {
                advance = k + 1;
                break;
            }
        }
        index = advance;
    }

    tracker.into_records()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Price, WhereGet};

    fn table(json: &str) -> PriceTable {
        PriceTable::from_json_str(json).unwrap()
    }

    #[test]
    fn test_parse_wands_basic_entry() {
        let raw = "\
Wand of Fireballs
Wand
Add
Wand, Rare (requires attunement by a spellcaster)
1200
This wand has 7 charges. While holding it, you can use an action to expend charges.
";
        let records = parse_wands(raw, &table(r#"{"Wand of Fireballs": "1,200 gp"}"#));
        assert_eq!(records.len(), 1);
        let wand = &records[0];
        assert_eq!(wand.name, "Wand of Fireballs");
        assert_eq!(wand.rarity, Rarity::Rare);
        assert_eq!(wand.price, Price::Gold(1200));
        assert_eq!(wand.attunement.as_deref(), Some("Requires Attunement by a spellcaster"));
        assert_eq!(
            wand.class_recommendations.as_deref().map(|c| c.len()),
            Some(6)
        );
        assert_eq!(wand.where_get, WhereGet::Research);
        assert_eq!(wand.gacha.as_deref(), Some("Rare Wand Research"));
        assert!(wand.description.starts_with("This wand has 7 charges."));
    }

    #[test]
    fn test_parse_wands_legacy_replaces_duplicate() {
        let raw = "\
Wand of Fear
Wand
Wand, Rare
This wand has 3 charges.
Wand of Fear
LegacyWand
Wand, Rare
This wand has 5 charges.
";
        let records = parse_wands(raw, &PriceTable::default());
        assert_eq!(records.len(), 1);
        assert!(records[0].description.contains("5 charges"));
    }

    #[test]
    fn test_parse_wands_emits_entry_named_without_wand_keyword() {
        let raw = "\
Wand of Fireballs
Wand
Wand, Rare
This wand has 7 charges.
Radiance
Wand
Wand, Uncommon
This wand sheds bright light.
";
        let records = parse_wands(raw, &PriceTable::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Wand of Fireballs");
        assert!(!records[0].description.contains("Radiance"));
        assert_eq!(records[1].name, "Radiance");
        assert_eq!(records[1].rarity, Rarity::Uncommon);
        assert!(records[1].description.contains("bright light"));
    }

    #[test]
    fn test_parse_wands_rejects_block_without_category() {
        let raw = "\
Wand of Nothing
Wand
some prose that is not a category line
";
        let records = parse_wands(raw, &PriceTable::default());
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_wands_unknown_rarity_defaults_to_rare() {
        let raw = "\
Wand of Mystery
Wand
Wand, peculiar
This wand has 1 charge.
";
        let records = parse_wands(raw, &PriceTable::default());
        assert_eq!(records[0].rarity, Rarity::Rare);
    }

    #[test]
    fn test_parse_staffs_window_and_rarity_rejection() {
        let raw = "\
Staff of the Python
Staff
Add
Staff, Uncommon (requires attunement by a cleric, druid, or warlock)
Weight: 4 lb.
You can use an action to speak this staff's command word.

Staff of Mystery
Staff
Add
Staff, peculiar
This block has no rarity keyword and is rejected.
";
        let records = parse_staffs(raw, &PriceTable::default());
        assert_eq!(records.len(), 1);
        let staff = &records[0];
        assert_eq!(staff.name, "Staff of the Python");
        assert_eq!(staff.rarity, Rarity::Uncommon);
        assert_eq!(staff.where_get, WhereGet::MagiciansMenagerie);
        assert_eq!(staff.gacha, None);
        assert_eq!(
            staff.class_recommendations.as_deref(),
            Some(&["Cleric".to_string(), "Druid".to_string(), "Warlock".to_string()][..])
        );
        assert!(staff.description.contains("command word"));
    }

    #[test]
    fn test_parse_wondrous_case_insensitive_dedup_and_legacy() {
        let raw = "\
Bag of Holding
Wondrous item, Uncommon
Source: Dungeon Master's Guide
This bag has an interior space far larger than its outside.
Amount to add
Legacy \u{2022} BAG OF HOLDING
Wondrous item, Uncommon
Source: Dungeon Master's Guide
The legacy printing of the bag.
Amount to add
";
        let records = parse_wondrous(raw, &table(r#"{"Bag of Holding": "500 gp"}"#));
        assert_eq!(records.len(), 1);
        let bag = &records[0];
        assert!(bag.name.eq_ignore_ascii_case("Bag of Holding"));
        assert!(bag.description.contains("legacy printing"));
        assert_eq!(bag.price, Price::Gold(500));
        assert_eq!(bag.where_get, WhereGet::MagiciansMenagerie);
    }

    #[test]
    fn test_parse_wondrous_without_terminator_keeps_items_separate() {
        let raw = "\
Orb of Light
Wondrous item, Rare
Source: DMG
The orb glows.
Moonstone
Wondrous item, Rare
Source: DMG
The stone hums.
";
        let records = parse_wondrous(raw, &PriceTable::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "The orb glows.");
        assert!(!records[0].description.contains("Moonstone"));
        assert_eq!(records[1].name, "Moonstone");
        assert_eq!(records[1].description, "The stone hums.");
    }

    #[test]
    fn test_parse_wondrous_gacha_spelling() {
        let raw = "\
Ioun Stone
Wondrous item, Very Rare (requires attunement)
Source: Dungeon Master's Guide
This stone orbits your head.
Amount to add
";
        let records = parse_wondrous(raw, &PriceTable::default());
        assert_eq!(records[0].gacha.as_deref(), Some("Very Rare Wonderous Research"));
        assert_eq!(records[0].price, Price::Unknown);
    }

    #[test]
    fn test_parse_weapons_end_to_end_flame_tongue() {
        let raw = "\
Flame Tongue Longsword
Weapon
Weapon, Rare (requires attunement)
Attack Type:
Melee
Damage:
1d8
Add Item
";
        let records = parse_weapons(raw, &PriceTable::default());
        assert_eq!(records.len(), 1);
        let weapon = &records[0];
        assert_eq!(weapon.name, "Flame Tongue Enchantment");
        assert_eq!(weapon.attunement.as_deref(), Some("Requires Attunement"));
        assert_eq!(weapon.where_get, WhereGet::Research);
        assert_eq!(weapon.gacha.as_deref(), Some("Rare Weapon Research"));
        assert_eq!(
            weapon.weapon_types.as_deref(),
            Some(&["Longsword".to_string()][..])
        );
    }

    #[test]
    fn test_parse_weapons_grouping_across_blocks() {
        let raw = "\
Longsword of Warning
Weapon, Uncommon
Add Item
Battleaxe of Warning
Weapon, Uncommon
Add Item
Battleaxe of Warning
Weapon, Uncommon
Add Item
";
        let records = parse_weapons(raw, &PriceTable::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Weapon of Warning Enchantment");
        assert_eq!(
            records[0].weapon_types.as_deref(),
            Some(&["Battleaxe".to_string(), "Longsword".to_string()][..])
        );
    }

    #[test]
    fn test_parse_weapons_excluded_types_never_emitted() {
        let raw = "\
Laser Pistol
Weapon, Rare
Add Item
Laser Pistol +1
Weapon, Rare
Add Item
Longsword
Weapon, Common
Add Item
";
        let records = parse_weapons(raw, &PriceTable::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Longsword");
        assert_eq!(records[0].where_get, WhereGet::IroncladMonkey);
    }

    #[test]
    fn test_run_category_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wands.txt");
        let prices = dir.path().join("priceTable.json");
        let output = dir.path().join("wands.json");
        std::fs::write(
            &input,
            "Wand of Fireballs\nWand\nWand, Rare\nThis wand has 7 charges.\n",
        )
        .unwrap();
        std::fs::write(&prices, r#"{"Wand of Fireballs": "1,200 gp"}"#).unwrap();

        let records = run_category(ItemType::Wand, &input, &prices, &output).unwrap();
        assert_eq!(records.len(), 1);

        let written = std::fs::read_to_string(&output).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed[0]["name"], "Wand of Fireballs");
        assert_eq!(parsed[0]["type"], "Wand");
        assert_eq!(parsed[0]["price"], 1200);
    }

    #[test]
    fn test_run_category_missing_input_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("staffs.json");
        let records = run_category(
            ItemType::Staff,
            &dir.path().join("no-such-file.txt"),
            &dir.path().join("no-such-table.json"),
            &output,
        )
        .unwrap();
        assert!(records.is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_price_table_yields_na_everywhere() {
        let raw = "\
Wand of Fireballs
Wand
Wand, Rare
This wand has 7 charges.
";
        let records = parse_wands(raw, &PriceTable::default());
        assert!(records.iter().all(|r| r.price == Price::Unknown));
    }
}
