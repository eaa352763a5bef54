//! Run summaries: rarity distribution and sample previews logged at the
//! end of each category run.

use crate::models::{ItemRecord, Price, Rarity};
use std::collections::BTreeMap;

/// Count records per rarity, most frequent first. Ties break on rarity
/// order so the output is stable.
pub fn rarity_distribution(records: &[ItemRecord]) -> Vec<(Rarity, usize)> {
    let mut counts: BTreeMap<Rarity, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.rarity).or_insert(0) += 1;
    }
    let mut pairs: Vec<(Rarity, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    pairs
}

/// One-line preview of a record for the run log.
pub fn sample_line(record: &ItemRecord) -> String {
    let price = match record.price {
        Price::Gold(gold) => format!("{} gp", gold),
        Price::Unknown => "NA".to_string(),
    };
    format!(
        "{} [{} {}] {} via {}",
        record.name, record.rarity, record.item_type, price, record.where_get
    )
}
