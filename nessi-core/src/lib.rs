//! Core library for the Nessi item importer: parsing semi-structured item
//! dumps into normalized JSON records.

pub mod dedupe;
pub mod enchant;
pub mod error;
pub mod extract;
pub mod file_utils;
pub mod models;
pub mod pipeline;
pub mod price;
pub mod report;
pub mod segment;

pub use error::{NessiError, Result};
pub use models::{ItemRecord, ItemType, Price, Rarity, WhereGet};
pub use pipeline::{parse_category, run_category};
