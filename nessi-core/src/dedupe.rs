//! Deduplication of repeated item entries within one run.
//!
//! The dump frequently carries the same item twice, once as a current
//! printing and once as a "Legacy" variant. A Legacy variant replaces an
//! already-tracked non-Legacy entry in place (keeping its list position);
//! any other duplicate is dropped. Output preserves first-seen order.

use crate::models::ItemRecord;
use std::collections::HashMap;

pub struct Tracker {
    case_insensitive: bool,
    index: HashMap<String, usize>,
    entries: Vec<(ItemRecord, bool)>,
}

impl Tracker {
    /// Wondrous items key case-insensitively; every other category uses
    /// exact name match.
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            case_insensitive,
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn key(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn insert(&mut self, record: ItemRecord, is_legacy: bool) {
        let key = self.key(&record.name);
        match self.index.get(&key) {
            Some(&position) => {
                let (tracked, tracked_legacy) = &mut self.entries[position];
                if is_legacy && !*tracked_legacy {
                    *tracked = record;
                    *tracked_legacy = true;
                }
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((record, is_legacy));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_records(self) -> Vec<ItemRecord> {
        self.entries.into_iter().map(|(record, _)| record).collect()
    }
}
