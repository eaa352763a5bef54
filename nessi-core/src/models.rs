//! Data models for the item catalog output schema.

use serde::{Deserialize, Serialize, Serializer};

/// Item rarity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    #[serde(rename = "Very Rare")]
    VeryRare,
    Legendary,
    Artifact,
}

/// Containment-scan order for rarity keywords. Longer labels come first so
/// that a line containing "Very Rare" never matches as plain "Rare", and
/// "Uncommon" is tested before "Common".
pub const RARITY_SCAN_ORDER: [(&str, Rarity); 6] = [
    ("Very Rare", Rarity::VeryRare),
    ("Legendary", Rarity::Legendary),
    ("Artifact", Rarity::Artifact),
    ("Uncommon", Rarity::Uncommon),
    ("Common", Rarity::Common),
    ("Rare", Rarity::Rare),
];

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::VeryRare => "Very Rare",
            Rarity::Legendary => "Legendary",
            Rarity::Artifact => "Artifact",
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item categories, one per pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Weapon,
    Wand,
    Staff,
    #[serde(rename = "Wondrous Item")]
    WondrousItem,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Weapon => "Weapon",
            ItemType::Wand => "Wand",
            ItemType::Staff => "Staff",
            ItemType::WondrousItem => "Wondrous Item",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acquisition source, derived from rarity alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhereGet {
    Research,
    #[serde(rename = "Magicians Menagerie")]
    MagiciansMenagerie,
    #[serde(rename = "Ironclad Monkey")]
    IroncladMonkey,
}

impl WhereGet {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhereGet::Research => "Research",
            WhereGet::MagiciansMenagerie => "Magicians Menagerie",
            WhereGet::IroncladMonkey => "Ironclad Monkey",
        }
    }
}

impl std::fmt::Display for WhereGet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved price: a gold amount, or the "NA" sentinel when no price could
/// be derived. "NA" is distinct from a price of 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Price {
    Gold(i64),
    Unknown,
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Price::Gold(value) => serializer.serialize_i64(*value),
            Price::Unknown => serializer.serialize_str("NA"),
        }
    }
}

/// One normalized output record. Field presence varies by category; absent
/// optional fields are omitted from the JSON entirely.
#[derive(Debug, Clone, Serialize)]
pub struct ItemRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub rarity: Rarity,
    pub description: String,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attunement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_recommendations: Option<Vec<String>>,
    pub where_get: WhereGet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gacha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_weight")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapon_types: Option<Vec<String>>,
}

fn serialize_weight<S: Serializer>(
    weight: &Option<f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    // skip_serializing_if already filtered None
    match weight {
        Some(w) if w.fract() == 0.0 => serializer.serialize_i64(*w as i64),
        Some(w) => serializer.serialize_f64(*w),
        None => serializer.serialize_none(),
    }
}

impl ItemRecord {
    /// A bare record with the per-category constants filled in and the
    /// derived acquisition fields applied.
    pub fn new(name: String, item_type: ItemType, rarity: Rarity) -> Self {
        let (where_get, gacha) = acquisition(rarity, item_type);
        Self {
            name,
            item_type,
            rarity,
            description: String::new(),
            price: Price::Unknown,
            attunement: None,
            class_recommendations: None,
            where_get,
            gacha,
            weight: None,
            weapon_types: None,
        }
    }
}

/// Derive `where_get` and the gacha label from rarity and category. Pure
/// and deterministic: two records with the same rarity and type always get
/// the same acquisition fields.
///
/// The "Wonderous" spelling in the Rare/Very Rare wondrous-item label is a
/// historical inconsistency in the downstream consumers and is preserved
/// as-is.
pub fn acquisition(rarity: Rarity, item_type: ItemType) -> (WhereGet, Option<String>) {
    match rarity {
        Rarity::Common => match item_type {
            ItemType::Weapon => (WhereGet::IroncladMonkey, None),
            _ => (WhereGet::MagiciansMenagerie, None),
        },
        Rarity::Uncommon => (WhereGet::MagiciansMenagerie, None),
        _ => {
            let label = match item_type {
                ItemType::Weapon => "Weapon",
                ItemType::Wand => "Wand",
                ItemType::Staff => "Staff",
                ItemType::WondrousItem => match rarity {
                    Rarity::Rare | Rarity::VeryRare => "Wonderous",
                    _ => "Wondrous Item",
                },
            };
            (
                WhereGet::Research,
                Some(format!("{} {} Research", rarity.as_str(), label)),
            )
        }
    }
}
