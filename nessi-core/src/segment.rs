//! Block segmentation: finding where one item's lines end and the next
//! item's begin in a delimiter-poor dump.
//!
//! Weapons use a literal "Add Item" delimiter. The other categories have no
//! delimiter at all, so their starts are detected by an ordered list of
//! named predicate rules evaluated at each line index. The rule order is
//! the tie-break order: the first rule that matches at an index wins, and
//! a rule later in the list is only consulted when every earlier rule has
//! failed at that index.

/// One start-of-item heuristic. `matches` inspects the line at `index`
/// plus a small lookahead window.
pub struct StartRule {
    pub name: &'static str,
    pub matches: fn(lines: &[String], index: usize) -> bool,
}

/// Wand start rules, in priority order.
pub const WAND_START_RULES: &[StartRule] = &[
    StartRule {
        name: "wand-header",
        matches: wand_header,
    },
    StartRule {
        name: "name-then-type",
        matches: wand_name_then_type,
    },
];

/// Staff start rule: a four-line window of name, base type, literal "Add",
/// and a category line mentioning Staff.
pub const STAFF_START_RULES: &[StartRule] = &[StartRule {
    name: "name-type-add-category",
    matches: staff_window,
}];

/// Wondrous-item start rule: any non-empty line whose successor starts
/// with "wondrous item".
pub const WONDROUS_START_RULES: &[StartRule] = &[StartRule {
    name: "name-then-wondrous-type",
    matches: wondrous_name_then_type,
}];

/// Return the name of the first rule matching at `index`, if any.
pub fn match_start(rules: &[StartRule], lines: &[String], index: usize) -> Option<&'static str> {
    rules
        .iter()
        .find(|rule| (rule.matches)(lines, index))
        .map(|rule| rule.name)
}

/// Split the raw weapon dump on the "Add Item" delimiter. Each chunk is
/// one candidate block of trimmed, non-empty lines.
pub fn split_weapon_entries(raw: &str) -> Vec<Vec<String>> {
    raw.split("Add Item")
        .map(|chunk| {
            chunk
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|lines| !lines.is_empty())
        .collect()
}

/// Trim every line and drop the empty ones. Used by the wand scan, which
/// operates on a dense line sequence.
pub fn dense_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim every line but keep the empty ones. The staff and wondrous scans
/// rely on blank lines surviving so description stretches keep their shape.
pub fn trimmed_lines(raw: &str) -> Vec<String> {
    raw.lines().map(|line| line.trim().to_string()).collect()
}

/// A line that *is* a wand header: it mentions "Wand" but is neither a
/// category line ("Wand, Rare ...") nor descriptive prose. Prose is
/// filtered by rejecting lowercase "wand" and common rules-text verbs.
fn wand_header(lines: &[String], index: usize) -> bool {
    let line = &lines[index];
    line.contains("Wand")
        && !line.contains("Wand,")
        && !line.starts_with("Legacy")
        && !line.contains("holding")
        && !line.contains("wand")
        && !line.contains("spell")
        && !line.contains("charges")
        && !line.contains("action")
        && !line.contains("expend")
        && line != "Wand"
        && line != "LegacyWand"
}

/// A name line immediately followed by a bare "Wand" type line, catching
/// wands whose names do not mention the word (e.g. "Radiance").
fn wand_name_then_type(lines: &[String], index: usize) -> bool {
    let line = &lines[index];
    let next = lines.get(index + 1).map(String::as_str).unwrap_or("");
    next == "Wand" && !line.contains("Add Item") && !line.contains("Amount") && line.len() > 2
}

fn staff_window(lines: &[String], index: usize) -> bool {
    if index + 3 >= lines.len() {
        return false;
    }
    lines[index + 2] == "Add" && lines[index + 3].contains("Staff")
}

fn wondrous_name_then_type(lines: &[String], index: usize) -> bool {
    if lines[index].is_empty() {
        return false;
    }
    lines
        .get(index + 1)
        .map(|next| next.to_lowercase().starts_with("wondrous item"))
        .unwrap_or(false)
}
