//! Enchantment grouping for weapons.
//!
//! Many dump entries are per-base-type instances of one generic magical
//! enchantment ("Longsword of Warning", "Battleaxe of Warning"). Those are
//! collapsed into a single enchantment record carrying the set of base
//! weapon types it applies to.
//!
//! The patterns live in one ordered table. Order is precedence: several
//! patterns overlap (a named suffix is also an "X of Y" shape), so the
//! specific entries must come before the generic catch-alls at the end.

use crate::models::ItemRecord;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

/// Base weapon types recognized when pulling the type token out of an
/// instance name.
pub const KNOWN_WEAPON_TYPES: &[&str] = &[
    "Battleaxe",
    "Blowgun",
    "Club",
    "Dagger",
    "Dart",
    "Flail",
    "Glaive",
    "Greataxe",
    "Greatclub",
    "Greatsword",
    "Halberd",
    "Handaxe",
    "Hand Crossbow",
    "Heavy Crossbow",
    "Javelin",
    "Lance",
    "Light Crossbow",
    "Light Hammer",
    "Longbow",
    "Longsword",
    "Mace",
    "Maul",
    "Morningstar",
    "Net",
    "Pike",
    "Quarterstaff",
    "Rapier",
    "Scimitar",
    "Shortbow",
    "Shortsword",
    "Sickle",
    "Sling",
    "Spear",
    "Trident",
    "War Pick",
    "Warhammer",
    "Whip",
    "Yklwa",
];

/// Anachronistic weapon types that never reach the output, neither as
/// standalone records nor inside an enchantment's type set.
pub const EXCLUDED_WEAPON_TYPES: &[&str] = &[
    "Pistol",
    "Musket",
    "Revolver",
    "Rifle",
    "Hunting Rifle",
    "Shotgun",
    "Semiautomatic Pistol",
    "Laser Pistol",
    "Laser Rifle",
    "Antimatter Rifle",
];

/// One naming pattern. The variant determines both the match shape and the
/// derived canonical enchantment name.
#[derive(Debug, Clone, Copy)]
pub enum EnchantPattern {
    /// "<Base> <suffix>", named "Weapon <suffix> Enchantment".
    Suffix(&'static str),
    /// "<prefix> <Base>", named "<prefix> Enchantment".
    Prefix(&'static str),
    /// "<Base> +N" or "+N <Base>", named "Weapon +N Enchantment".
    PlusBonus,
    /// "<Base> of <anything>", named "Weapon of <anything> Enchantment".
    GenericOf,
}

/// The pattern table, in precedence order. Named suffixes first, then
/// named prefixes, then the two generic catch-alls.
pub const ENCHANT_PATTERNS: &[EnchantPattern] = &[
    EnchantPattern::Suffix("of Warning"),
    EnchantPattern::Suffix("of Wounding"),
    EnchantPattern::Suffix("of Venom"),
    EnchantPattern::Suffix("of Life Stealing"),
    EnchantPattern::Suffix("of Sharpness"),
    EnchantPattern::Suffix("of Speed"),
    EnchantPattern::Suffix("of Vengeance"),
    EnchantPattern::Suffix("of Slaying"),
    EnchantPattern::Suffix("of Answering"),
    EnchantPattern::Suffix("of Certain Death"),
    EnchantPattern::Suffix("of the Deep"),
    EnchantPattern::Suffix("of Mercy"),
    EnchantPattern::Suffix("of Returning"),
    EnchantPattern::Suffix("of Lightning"),
    EnchantPattern::Suffix("of Smiting"),
    EnchantPattern::Prefix("Flame Tongue"),
    EnchantPattern::Prefix("Frost Brand"),
    EnchantPattern::Prefix("Vicious"),
    EnchantPattern::Prefix("Dancing"),
    EnchantPattern::Prefix("Defender"),
    EnchantPattern::Prefix("Dragon Slayer"),
    EnchantPattern::Prefix("Giant Slayer"),
    EnchantPattern::Prefix("Holy Avenger"),
    EnchantPattern::Prefix("Luck Blade"),
    EnchantPattern::Prefix("Nine Lives Stealer"),
    EnchantPattern::Prefix("Corpse Slayer"),
    EnchantPattern::Prefix("Dragon's Wrath"),
    EnchantPattern::Prefix("Moon-Touched"),
    EnchantPattern::Prefix("Ruidium"),
    EnchantPattern::Prefix("Hellfire"),
    EnchantPattern::Prefix("Oceanic"),
    EnchantPattern::Prefix("Acheron Blade"),
    EnchantPattern::Prefix("Mind Blade"),
    EnchantPattern::Prefix("Sylvan Talon"),
    EnchantPattern::Prefix("Adamantine"),
    EnchantPattern::Prefix("Silvered"),
    EnchantPattern::Prefix("Mithral"),
    EnchantPattern::Prefix("Drow Poisoned"),
    EnchantPattern::Prefix("Dwarven Thrower"),
    EnchantPattern::Prefix("Sun Blade"),
    EnchantPattern::Prefix("Sword of Wounding"),
    EnchantPattern::Prefix("Blackrazor"),
    EnchantPattern::Prefix("Seeking"),
    EnchantPattern::Prefix("Thundering"),
    EnchantPattern::Prefix("Blazing"),
    EnchantPattern::PlusBonus,
    EnchantPattern::GenericOf,
];

lazy_static! {
    static ref TRAILING_BONUS_RE: Regex = Regex::new(r"^(.+?),?\s*\+(\d+)$").unwrap();
    static ref LEADING_BONUS_RE: Regex = Regex::new(r"^\+(\d+)\s+(.+)$").unwrap();
    static ref GENERIC_OF_RE: Regex = Regex::new(r"^(.+?) of (.+)$").unwrap();
}

/// A successful pattern match: the canonical enchantment name plus the
/// base weapon type this instance applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnchantMatch {
    pub enchant_name: String,
    pub weapon_type: String,
}

/// Canonical capitalization for a base-type token, or None when the token
/// is not a recognized weapon type. Excluded types are still recognized
/// here; exclusion is applied when sets are built.
fn canonical_weapon_type(token: &str) -> Option<&'static str> {
    KNOWN_WEAPON_TYPES
        .iter()
        .chain(EXCLUDED_WEAPON_TYPES.iter())
        .find(|t| t.eq_ignore_ascii_case(token.trim()))
        .copied()
}

/// True when the name belongs to an anachronistic weapon type.
pub fn is_excluded_weapon(name: &str) -> bool {
    let lower = name.to_lowercase();
    EXCLUDED_WEAPON_TYPES
        .iter()
        .any(|t| lower.contains(&t.to_lowercase()))
}

impl EnchantPattern {
    fn apply(&self, name: &str) -> Option<EnchantMatch> {
        match self {
            EnchantPattern::Suffix(suffix) => {
                let base = name.strip_suffix(suffix)?.trim_end();
                let weapon_type = canonical_weapon_type(base)?;
                Some(EnchantMatch {
                    enchant_name: format!("Weapon {} Enchantment", suffix),
                    weapon_type: weapon_type.to_string(),
                })
            }
            EnchantPattern::Prefix(prefix) => {
                let base = name.strip_prefix(prefix)?.trim_start();
                let weapon_type = canonical_weapon_type(base)?;
                Some(EnchantMatch {
                    enchant_name: format!("{} Enchantment", prefix),
                    weapon_type: weapon_type.to_string(),
                })
            }
            EnchantPattern::PlusBonus => {
                if let Some(caps) = TRAILING_BONUS_RE.captures(name) {
                    if let Some(weapon_type) = canonical_weapon_type(&caps[1]) {
                        return Some(EnchantMatch {
                            enchant_name: format!("Weapon +{} Enchantment", &caps[2]),
                            weapon_type: weapon_type.to_string(),
                        });
                    }
                }
                let caps = LEADING_BONUS_RE.captures(name)?;
                let weapon_type = canonical_weapon_type(&caps[2])?;
                Some(EnchantMatch {
                    enchant_name: format!("Weapon +{} Enchantment", &caps[1]),
                    weapon_type: weapon_type.to_string(),
                })
            }
            EnchantPattern::GenericOf => {
                let caps = GENERIC_OF_RE.captures(name)?;
                let weapon_type = canonical_weapon_type(&caps[1])?;
                Some(EnchantMatch {
                    enchant_name: format!("Weapon of {} Enchantment", &caps[2]),
                    weapon_type: weapon_type.to_string(),
                })
            }
        }
    }
}

/// Test a weapon name against the pattern table. First match wins.
pub fn match_enchantment(name: &str) -> Option<EnchantMatch> {
    ENCHANT_PATTERNS
        .iter()
        .find_map(|pattern| pattern.apply(name))
}

struct EnchantGroup {
    name: String,
    template: ItemRecord,
    weapon_types: BTreeSet<String>,
}

/// Per-run accumulator for enchantment groups. The first matched instance
/// supplies the field template (rarity, price, description, attunement);
/// later instances only contribute their base type.
#[derive(Default)]
pub struct EnchantmentGroups {
    groups: Vec<EnchantGroup>,
}

impl EnchantmentGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, matched: EnchantMatch, record: ItemRecord) {
        let excluded = EXCLUDED_WEAPON_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&matched.weapon_type));
        match self
            .groups
            .iter_mut()
            .find(|group| group.name == matched.enchant_name)
        {
            Some(group) => {
                if !excluded {
                    group.weapon_types.insert(matched.weapon_type);
                }
            }
            None => {
                let mut weapon_types = BTreeSet::new();
                if !excluded {
                    weapon_types.insert(matched.weapon_type);
                }
                self.groups.push(EnchantGroup {
                    name: matched.enchant_name,
                    template: record,
                    weapon_types,
                });
            }
        }
    }

    /// Emit one record per non-empty group, in first-seen order, with the
    /// sorted base-type set attached. Per-instance weight does not survive
    /// grouping.
    pub fn into_records(self) -> Vec<ItemRecord> {
        self.groups
            .into_iter()
            .filter(|group| !group.weapon_types.is_empty())
            .map(|group| {
                let mut record = group.template;
                record.name = group.name;
                record.weight = None;
                record.weapon_types = Some(group.weapon_types.into_iter().collect());
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemType, Price, Rarity};

    fn record(name: &str) -> ItemRecord {
        let mut r = ItemRecord::new(name.to_string(), ItemType::Weapon, Rarity::Rare);
        r.price = Price::Gold(500);
        r
    }

    #[test]
    fn test_suffix_pattern_names_the_enchantment() {
        let m = match_enchantment("Longsword of Warning").unwrap();
        assert_eq!(m.enchant_name, "Weapon of Warning Enchantment");
        assert_eq!(m.weapon_type, "Longsword");
    }

    #[test]
    fn test_prefix_pattern_names_the_enchantment() {
        let m = match_enchantment("Flame Tongue Longsword").unwrap();
        assert_eq!(m.enchant_name, "Flame Tongue Enchantment");
        assert_eq!(m.weapon_type, "Longsword");
    }

    #[test]
    fn test_plus_bonus_both_orders() {
        let m = match_enchantment("Longsword +1").unwrap();
        assert_eq!(m.enchant_name, "Weapon +1 Enchantment");
        let m = match_enchantment("+2 Battleaxe").unwrap();
        assert_eq!(m.enchant_name, "Weapon +2 Enchantment");
        assert_eq!(m.weapon_type, "Battleaxe");
    }

    #[test]
    fn test_named_suffix_beats_generic_of() {
        // "of Warning" is also an "X of Y" shape; the named entry is
        // earlier in the table and must win.
        let m = match_enchantment("Battleaxe of Warning").unwrap();
        assert_eq!(m.enchant_name, "Weapon of Warning Enchantment");
    }

    #[test]
    fn test_generic_of_catches_unlisted_suffixes() {
        let m = match_enchantment("Dagger of the Emerald Court").unwrap();
        assert_eq!(m.enchant_name, "Weapon of the Emerald Court Enchantment");
        assert_eq!(m.weapon_type, "Dagger");
    }

    #[test]
    fn test_unique_names_do_not_match() {
        assert!(match_enchantment("Blackrazor").is_none());
        assert!(match_enchantment("Excalibur").is_none());
        // Base token is not a weapon type.
        assert!(match_enchantment("Staff of Power").is_none());
    }

    #[test]
    fn test_grouping_collects_sorted_deduplicated_types() {
        let mut groups = EnchantmentGroups::new();
        for name in [
            "Longsword of Warning",
            "Battleaxe of Warning",
            "Battleaxe of Warning",
        ] {
            let m = match_enchantment(name).unwrap();
            groups.add(m, record(name));
        }
        let records = groups.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Weapon of Warning Enchantment");
        assert_eq!(
            records[0].weapon_types.as_deref(),
            Some(&["Battleaxe".to_string(), "Longsword".to_string()][..])
        );
    }

    #[test]
    fn test_first_instance_is_template() {
        let mut groups = EnchantmentGroups::new();
        let mut first = record("Longsword of Speed");
        first.description = "Extra attack.".to_string();
        groups.add(match_enchantment("Longsword of Speed").unwrap(), first);
        let mut second = record("Rapier of Speed");
        second.description = "different".to_string();
        groups.add(match_enchantment("Rapier of Speed").unwrap(), second);
        let records = groups.into_records();
        assert_eq!(records[0].description, "Extra attack.");
        assert_eq!(records[0].price, Price::Gold(500));
    }

    #[test]
    fn test_excluded_types_filtered_from_sets() {
        let mut groups = EnchantmentGroups::new();
        groups.add(
            match_enchantment("Laser Pistol +1").unwrap(),
            record("Laser Pistol +1"),
        );
        assert!(groups.into_records().is_empty());

        let mut groups = EnchantmentGroups::new();
        groups.add(
            match_enchantment("Musket of Warning").unwrap(),
            record("Musket of Warning"),
        );
        groups.add(
            match_enchantment("Longsword of Warning").unwrap(),
            record("Longsword of Warning"),
        );
        let records = groups.into_records();
        assert_eq!(
            records[0].weapon_types.as_deref(),
            Some(&["Longsword".to_string()][..])
        );
    }

    #[test]
    fn test_is_excluded_weapon() {
        assert!(is_excluded_weapon("Laser Pistol"));
        assert!(is_excluded_weapon("Antimatter Rifle +2"));
        assert!(!is_excluded_weapon("Longsword"));
    }
}
