//! Price resolution against the external price table.
//!
//! The table maps canonical item names to a bare number or a currency
//! string ("1,500 gp"). Dump names rarely match the table verbatim, so
//! resolution walks a fixed sequence of name-variant rewrites and, for
//! weapons, pattern-derived generic names. First hit wins.

use crate::enchant::match_enchantment;
use crate::error::Result;
use crate::models::{ItemType, Price, Rarity};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Fallback for weapon/wand price strings that carry no usable digits.
pub const PRICE_FALLBACK: i64 = 100;

lazy_static! {
    static ref TRAILING_PAREN_RE: Regex = Regex::new(r"\s+\(.*\)$").unwrap();
}

/// A raw table value before cleaning.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

/// The price table, loaded once per run. A BTreeMap keeps the
/// prefix-key scan deterministic.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(BTreeMap<String, PriceValue>);

impl PriceTable {
    /// Load the table from a JSON file. A missing or malformed table is a
    /// warning, not a failure: resolution degrades to defaults/"NA".
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_json_str(&content) {
                Ok(table) => table,
                Err(err) => {
                    warn!("Malformed price table {:?}: {}", path, err);
                    Self::default()
                }
            },
            Err(err) => {
                warn!("Could not load price table {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn get(&self, key: &str) -> Option<&PriceValue> {
        self.0.get(key)
    }

    fn get_case_insensitive(&self, key: &str) -> Option<&PriceValue> {
        let lower = key.to_lowercase();
        self.0
            .iter()
            .find(|(k, _)| k.to_lowercase() == lower)
            .map(|(_, v)| v)
    }

    /// First table entry whose key is a prefix of `name`, in key order.
    fn get_by_key_prefix(&self, name: &str) -> Option<&PriceValue> {
        self.0
            .iter()
            .find(|(k, _)| !k.is_empty() && name.starts_with(k.as_str()))
            .map(|(_, v)| v)
    }
}

/// Resolve a price for `name`. Returns the "NA" sentinel when every lookup
/// misses.
pub fn resolve_price(
    name: &str,
    item_type: ItemType,
    rarity: Rarity,
    table: &PriceTable,
) -> Price {
    for candidate in name_variants(name, item_type) {
        if let Some(value) = table.get(&candidate) {
            return convert_price(value, item_type, rarity);
        }
    }

    if item_type == ItemType::WondrousItem {
        if let Some(value) = table.get_case_insensitive(name) {
            return convert_price(value, item_type, rarity);
        }
    }

    if item_type == ItemType::Weapon {
        if let Some(value) = weapon_generic_lookup(name, table) {
            return convert_price(value, item_type, rarity);
        }
    }

    Price::Unknown
}

/// The fixed variant-rewrite sequence, most specific first.
fn name_variants(name: &str, item_type: ItemType) -> Vec<String> {
    let mut variants = vec![name.to_string()];
    if item_type == ItemType::Wand {
        if let Some(stripped) = name.strip_prefix("Wand of ") {
            variants.push(stripped.to_string());
        }
        if let Some(stripped) = name.strip_prefix("Wand ") {
            variants.push(stripped.to_string());
        }
    }
    variants.push(name.replace(',', ""));
    variants.push(TRAILING_PAREN_RE.replace(name, "").into_owned());
    variants.push(name.to_lowercase());
    variants.push(name.to_uppercase());
    variants
}

/// Weapon-only generic lookups, tried after every direct variant misses:
/// the pattern-derived generic name, a prefix-key scan over the table, the
/// "Vicious Weapon" special case, and a per-word generic fallback.
fn weapon_generic_lookup<'a>(name: &str, table: &'a PriceTable) -> Option<&'a PriceValue> {
    if let Some(matched) = match_enchantment(name) {
        if let Some(generic) = matched.enchant_name.strip_suffix(" Enchantment") {
            if let Some(value) = table.get(generic) {
                return Some(value);
            }
        }
    }

    if let Some(value) = table.get_by_key_prefix(name) {
        return Some(value);
    }

    if name.starts_with("Vicious ") {
        if let Some(value) = table.get("Vicious Weapon") {
            return Some(value);
        }
    }

    name.split_whitespace()
        .filter(|word| word.len() > 3)
        .find_map(|word| table.get(&format!("Weapon of {}", word)))
}

/// Clean and parse a table value. Currency annotations and thousands
/// separators are stripped before parsing; a string with no usable digits
/// falls back per category.
fn convert_price(value: &PriceValue, item_type: ItemType, rarity: Rarity) -> Price {
    match value {
        PriceValue::Number(n) => Price::Gold(n.round() as i64),
        PriceValue::Text(s) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            match digits.parse::<i64>() {
                Ok(n) => Price::Gold(n),
                Err(_) => unparseable_fallback(item_type, rarity),
            }
        }
    }
}

fn unparseable_fallback(item_type: ItemType, rarity: Rarity) -> Price {
    match item_type {
        ItemType::Weapon | ItemType::Wand => Price::Gold(PRICE_FALLBACK),
        ItemType::Staff => Price::Gold(staff_default_price(rarity)),
        ItemType::WondrousItem => Price::Unknown,
    }
}

/// Rarity-keyed default staff pricing, used when the table entry exists
/// but carries no parseable number.
pub fn staff_default_price(rarity: Rarity) -> i64 {
    match rarity {
        Rarity::Common => 50,
        Rarity::Uncommon => 200,
        Rarity::Rare => 2000,
        Rarity::VeryRare => 8000,
        Rarity::Legendary | Rarity::Artifact => 25000,
    }
}
