//! Field extraction: turning one item block into the normalized fields of
//! an output record.
//!
//! Everything in here is heuristic. The dump format carries metadata lines
//! (Weight:, Cost:, Source:, tag words, page references) interleaved with
//! the actual item description, and the extractors' job is to keep the
//! prose and drop the scaffolding.

use crate::models::{Rarity, RARITY_SCAN_ORDER};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ATTUNEMENT_BY_RE: Regex =
        Regex::new(r"(?i)requires attunement by ([^)]+)\)").unwrap();
    static ref SPELLCASTER_RE: Regex = Regex::new(r"(?i)\bspellcasters?\b").unwrap();
    static ref CLASS_RES: Vec<(Regex, &'static str)> = [
        "Bard", "Cleric", "Druid", "Sorcerer", "Warlock", "Wizard", "Paladin", "Ranger",
    ]
    .iter()
    .map(|name| {
        (
            Regex::new(&format!(r"(?i)\b{}\b", name.to_lowercase())).unwrap(),
            *name,
        )
    })
    .collect();
    static ref LEGACY_PREFIX_RE: Regex = Regex::new(r"(?i)^Legacy\s*\u{2022}?\s*").unwrap();
    static ref WEAPON_RARITY_RE: Regex = Regex::new(
        r"(?i)Weapon(?:\s*\([^)]+\))?,\s*(Common|Uncommon|Very Rare|Rare|Legendary|Artifact)"
    )
    .unwrap();
    static ref WEAPON_SKIP_RE: Regex = Regex::new(r"^(Amount to add|\d+|Add Item)$").unwrap();
    static ref WEAPON_LABEL_RE: Regex = Regex::new(
        r"^(Attack Type|Range|Damage|Damage Type|Weight|Cost|Properties|Source|Tags)$"
    )
    .unwrap();
    // Wand description metadata filters.
    static ref GUIDE_LINE_RE: Regex = Regex::new(r"^[A-Z][a-z]+('s Guide|Master's Guide)").unwrap();
    static ref SOURCE_CODE_RE: Regex = Regex::new(r"^[A-Z]{2,}(\s|$)").unwrap();
    static ref PAGE_REF_RE: Regex = Regex::new(r"^pg\. \d+|^p\d+").unwrap();
    static ref BARE_NUMBER_RE: Regex = Regex::new(r"^\d+$").unwrap();
    // Wand description cleanup passes, applied in order.
    static ref WEIGHT_FRAG_RE: Regex = Regex::new(r"(?i)Weight:\s*--\s*").unwrap();
    static ref COST_FRAG_RE: Regex = Regex::new(r"(?i)Cost:\s*--\s*").unwrap();
    static ref SOURCE_FRAG_RE: Regex = Regex::new(r"(?i)Source:\s*[^.]*\s*").unwrap();
    static ref TAGS_TAIL_RE: Regex = Regex::new(r"(?i)Tags:\s*[\w\s]*$").unwrap();
    static ref TAG_WORD_RE: Regex =
        Regex::new(r"(?i)\b(Buff|Combat|Social|Utility|Healing|Movement|Damage|Control)\b\s*")
            .unwrap();
    static ref AMOUNT_FRAG_RE: Regex = Regex::new(r"(?i)Amount to add\s*\d*\s*").unwrap();
    static ref ADD_ITEM_FRAG_RE: Regex = Regex::new(r"(?i)Add Item\s*").unwrap();
    static ref MULTI_SPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref SPACE_DOT_RE: Regex = Regex::new(r"\s+\.").unwrap();
    // Wondrous description handling.
    static ref WONDROUS_CATEGORY_RE: Regex = Regex::new(r"(?i)wondrous item[,\s]").unwrap();
    static ref WONDROUS_META_RE: Regex =
        Regex::new(r"(?i)^(Weight:|Cost:|Tags:|Version:|Capacity:|Amount to add)").unwrap();
    static ref TAGS_BLOCK_RE: Regex = Regex::new(r"(?is)\nTags:.*").unwrap();
    static ref BLANK_RUN_RE: Regex = Regex::new(r"(\r?\n){2,}").unwrap();
    static ref LEADING_SOURCE_RE: Regex = Regex::new(r"(?i)^Source:\s*").unwrap();
}

/// Scan a category line for a rarity keyword, longest label first, so that
/// "Very Rare Weapon" resolves to Very Rare and never plain Rare.
pub fn extract_rarity(line: &str) -> Option<Rarity> {
    RARITY_SCAN_ORDER
        .iter()
        .find(|(label, _)| line.contains(label))
        .map(|(_, rarity)| *rarity)
}

fn rarity_from_label(label: &str) -> Option<Rarity> {
    RARITY_SCAN_ORDER
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(label))
        .map(|(_, rarity)| *rarity)
}

/// Extract the attunement clause from a category line. A parenthesized
/// qualifier ("requires attunement by a Warlock)") is carried through; a
/// bare mention yields the plain clause.
pub fn extract_attunement(line: &str) -> Option<String> {
    if !line.to_lowercase().contains("requires attunement") {
        return None;
    }
    if let Some(caps) = ATTUNEMENT_BY_RE.captures(line) {
        let qualifier = caps[1].trim();
        if !qualifier.is_empty() {
            return Some(format!("Requires Attunement by {}", qualifier));
        }
    }
    Some("Requires Attunement".to_string())
}

/// Whole-word scan for class names in an attunement/category line. A
/// generic "spellcaster" requirement expands to the six core caster
/// classes and overrides any individual match.
pub fn extract_class_recommendations(line: &str) -> Vec<String> {
    if SPELLCASTER_RE.is_match(line) {
        return ["Bard", "Cleric", "Druid", "Sorcerer", "Warlock", "Wizard"]
            .iter()
            .map(|s| s.to_string())
            .collect();
    }
    CLASS_RES
        .iter()
        .filter(|(re, _)| re.is_match(line))
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Strip a leading "Legacy" marker (optionally bulleted) from an item name.
/// Returns the cleaned name and whether the marker was present.
pub fn strip_legacy_prefix(name: &str) -> (String, bool) {
    if LEGACY_PREFIX_RE.is_match(name) {
        (LEGACY_PREFIX_RE.replace(name, "").trim().to_string(), true)
    } else {
        (name.to_string(), false)
    }
}

/// Structured fields pulled out of one weapon block.
#[derive(Debug)]
pub struct WeaponBlock {
    pub name: String,
    pub rarity: Option<Rarity>,
    pub attunement: Option<String>,
    pub classes: Vec<String>,
    pub description: String,
    pub weight: Option<f64>,
}

/// Extract one weapon block: name line, a combined type/rarity line, then
/// colon-labelled properties with free description text in between.
pub fn extract_weapon_block(lines: &[String]) -> Option<WeaponBlock> {
    let mut index = 0;
    let name = lines.first()?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    index += 1;

    // The export repeats the name and inserts bare "Weapon"/"Add" lines
    // before the category line.
    while index < lines.len()
        && (lines[index] == name || lines[index] == "Add" || lines[index] == "Weapon")
    {
        index += 1;
    }

    let mut rarity = None;
    let mut attunement = None;
    let mut classes = Vec::new();
    if index < lines.len() {
        let type_line = &lines[index];
        index += 1;
        if let Some(caps) = WEAPON_RARITY_RE.captures(type_line) {
            rarity = rarity_from_label(&caps[1]);
        }
        attunement = extract_attunement(type_line);
        classes = extract_class_recommendations(type_line);
    }

    // Colon-terminated labels open a property; everything until the next
    // label belongs to it. Unlabelled leading lines are free description.
    let mut properties: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut free_text = String::new();
    for line in &lines[index.min(lines.len())..] {
        if WEAPON_SKIP_RE.is_match(line) {
            continue;
        }
        if let Some(label) = line.strip_suffix(':') {
            if let Some((key, value)) = current.take() {
                if !value.trim().is_empty() {
                    properties.push((key, value.trim().to_string()));
                }
            }
            current = Some((label.to_string(), String::new()));
        } else if let Some((_, value)) = current.as_mut() {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(line);
        } else if !WEAPON_LABEL_RE.is_match(line) {
            if !free_text.is_empty() {
                free_text.push('\n');
            }
            free_text.push_str(line);
        }
    }
    if let Some((key, value)) = current.take() {
        if !value.trim().is_empty() {
            properties.push((key, value.trim().to_string()));
        }
    }

    let get = |key: &str| {
        properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let weight = get("Weight")
        .filter(|value| *value != "--")
        .and_then(parse_decimal);
    let description = build_weapon_description(&free_text, &get);

    Some(WeaponBlock {
        name,
        rarity,
        attunement,
        classes,
        description,
        weight,
    })
}

/// Rebuild the weapon description in the original layout: attack type
/// header, free prose, then the damage/range/property/weight/source lines.
fn build_weapon_description<'a>(
    free_text: &str,
    get: &impl Fn(&str) -> Option<&'a str>,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    match get("Attack Type") {
        Some(attack_type) => parts.push(format!("{} weapon", attack_type)),
        None => parts.push("Weapon".to_string()),
    }
    if !free_text.trim().is_empty() {
        parts.push(String::new());
        parts.push(free_text.trim().to_string());
    }
    if let Some(damage) = get("Damage") {
        parts.push(String::new());
        parts.push(format!("Damage: {}", damage));
    }
    if let Some(damage_type) = get("Damage Type") {
        parts.push(format!("Damage Type: {}", damage_type.trim()));
    }
    if let Some(range) = get("Range") {
        parts.push(format!("Range: {}", range));
    }
    if let Some(props) = get("Properties") {
        parts.push(format!("Properties: {}", props));
    }
    if let Some(weight) = get("Weight") {
        if weight != "--" {
            parts.push(format!("Weight: {}", weight));
        }
    }
    if let Some(source) = get("Source") {
        parts.push(String::new());
        parts.push(format!("Source: {}", source));
    }
    parts.join("\n")
}

fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

/// Phrases that mark the start of real wand rules text. Lines seen before
/// any of these are leftover metadata and get dropped.
const WAND_CONTENT_MARKERS: [&str; 6] = [
    "This wand",
    "While holding",
    "charges",
    "action",
    "You can use",
    "spellcasting",
];

/// Accumulate a wand description starting at `start`. Returns the cleaned
/// description and the index where accumulation stopped.
pub fn extract_wand_description(lines: &[String], start: usize) -> (String, usize) {
    let mut description = String::new();
    let mut index = start;
    let mut in_content = false;

    while index < lines.len() {
        let line = &lines[index];
        if is_likely_next_wand_item(line) {
            break;
        }
        // A name line announced only by its bare type line underneath
        // ("Radiance" / "Wand"). Stopping here puts the resume point on
        // the name so the next entry is picked up.
        if line.len() > 2
            && matches!(
                lines.get(index + 1).map(String::as_str),
                Some("Wand") | Some("LegacyWand")
            )
        {
            break;
        }
        if line.starts_with("Weight:")
            || line.starts_with("Cost:")
            || line.starts_with("Source:")
            || line.starts_with("Tags:")
            || line.starts_with("Amount to add")
            || line == "--"
            || line == "Add Item"
            || GUIDE_LINE_RE.is_match(line)
        {
            index += 1;
            continue;
        }
        // Short all-caps source codes ("DMG", "BGDIA") and page references.
        if (SOURCE_CODE_RE.is_match(line) && line.len() <= 10)
            || PAGE_REF_RE.is_match(line)
            || (BARE_NUMBER_RE.is_match(line) && line.len() <= 3)
        {
            index += 1;
            continue;
        }
        if WAND_CONTENT_MARKERS.iter().any(|m| line.contains(m)) {
            in_content = true;
        }
        if in_content {
            if !description.is_empty() {
                description.push(' ');
            }
            description.push_str(line);
        }
        index += 1;
    }

    (clean_wand_description(&description), index)
}

/// A line that looks like the header of the next item rather than more
/// description text. Lowercase "wand" and rules-text verbs mean prose.
fn is_likely_next_wand_item(line: &str) -> bool {
    if line.is_empty() {
        return false;
    }
    if line.contains("Wand")
        && !line.contains("wand")
        && !line.contains("holding")
        && !line.contains("charges")
        && !line.contains("spell")
        && !line.contains("action")
        && !line.contains("expend")
        && line.len() > 3
        && line != "LegacyWand"
    {
        return true;
    }
    line.contains("Staff")
        || line.contains("Rod")
        || line.contains("Armor")
        || line.contains("Weapon")
        || (line.contains("Ring") && !line.contains("ring "))
        || line.contains("Amulet")
        || line.contains("Cloak")
}

fn clean_wand_description(description: &str) -> String {
    let mut out = description.to_string();
    for re in [
        &*WEIGHT_FRAG_RE,
        &*COST_FRAG_RE,
        &*SOURCE_FRAG_RE,
        &*TAGS_TAIL_RE,
        &*TAG_WORD_RE,
        &*AMOUNT_FRAG_RE,
        &*ADD_ITEM_FRAG_RE,
    ] {
        out = re.replace_all(&out, "").into_owned();
    }
    out = MULTI_SPACE_RE.replace_all(&out, " ").into_owned();
    out = SPACE_DOT_RE.replace_all(&out, ".").into_owned();
    out.trim().to_string()
}

/// Accumulate a staff description starting at `start` (the line after the
/// category line). The line sequence keeps blanks so prose paragraphs stay
/// intact. Returns the description and the index where accumulation
/// stopped. Capped at 1500 characters to avoid swallowing the next item
/// when no stop marker is present.
pub fn extract_staff_description(lines: &[String], start: usize) -> (String, usize) {
    let mut index = start;

    // Weight/Cost/Source preamble and blank padding.
    while index < lines.len()
        && (lines[index].contains("Weight:")
            || lines[index].contains("Cost:")
            || lines[index].contains("Source:")
            || lines[index] == "--"
            || lines[index].is_empty())
    {
        index += 1;
    }

    // One source-reference line in any of its observed shapes.
    if index < lines.len()
        && (lines[index].contains(", pg.")
            || lines[index].contains("Guide to ")
            || lines[index].contains("Manual")
            || lines[index].contains("Handbook"))
    {
        index += 1;
        if index < lines.len() && lines[index].is_empty() {
            index += 1;
        }
    }

    let mut description = String::new();
    while index < lines.len() {
        let line = &lines[index];
        let next_is_item_window = !line.is_empty()
            && index + 2 < lines.len()
            && !lines[index + 1].is_empty()
            && lines[index + 2] == "Add";
        if line == "Tags:" || line == "Amount to add" || line == "Add Item" || next_is_item_window
        {
            break;
        }
        if !line.trim().is_empty() {
            if !description.is_empty() {
                description.push(' ');
            }
            description.push_str(line);
        }
        index += 1;
        if description.len() > 1500 {
            break;
        }
    }

    (description.trim().to_string(), index)
}

/// Locate the wondrous category line for an item whose name sits at
/// `name_index`. Returns (category line, index of the line that matched
/// the category signature).
pub fn find_wondrous_category(lines: &[String], name_index: usize) -> (String, usize) {
    let mut j = name_index + 1;
    while j < lines.len() && !WONDROUS_CATEGORY_RE.is_match(&lines[j]) {
        j += 1;
    }
    let mut category = lines.get(j + 1).cloned().unwrap_or_default();
    // Sometimes the rarity rides on the type line itself:
    // "Wondrous item, Common (requires attunement)".
    if let Some(line) = lines.get(j) {
        if line.to_lowercase().contains("wondrous item") && line.contains(',') {
            let after = line.splitn(2, ',').nth(1).unwrap_or("").trim();
            if !after.is_empty() {
                category = after.to_string();
            }
        }
    }
    (category, j)
}

/// Accumulate a wondrous-item description. The description conventionally
/// starts after a "Source:" label found within a 12-line window of the
/// category signature.
pub fn extract_wondrous_description(lines: &[String], category_index: usize) -> String {
    let mut source_index = category_index;
    let window_end = (category_index + 12).min(lines.len());
    for k in category_index..window_end {
        if LEADING_SOURCE_RE.is_match(lines[k].trim()) {
            source_index = k;
            break;
        }
    }

    let mut collected: Vec<&str> = Vec::new();
    for k in (source_index + 1).min(lines.len())..lines.len() {
        let line = &lines[k];
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        if lower.starts_with("amount to add") || lower.starts_with("add item") {
            break;
        }
        // Next item's name line: a single token followed by its
        // "Wondrous item" category line. Items without an "Amount to add"
        // terminator end here.
        if !trimmed.is_empty()
            && !trimmed.contains(' ')
            && lines
                .get(k + 1)
                .map(|next| WONDROUS_CATEGORY_RE.is_match(next))
                .unwrap_or(false)
        {
            break;
        }
        if WONDROUS_META_RE.is_match(trimmed) {
            continue;
        }
        collected.push(line);
    }
    clean_wondrous_description(collected.join("\n").trim())
}

fn clean_wondrous_description(raw: &str) -> String {
    let mut out = TAGS_BLOCK_RE.replace(raw, "").trim().to_string();
    out = BLANK_RUN_RE.replace_all(&out, "\n\n").into_owned();
    out = LEADING_SOURCE_RE.replace(&out, "").into_owned();
    out.trim().to_string()
}
