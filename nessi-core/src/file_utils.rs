//! File utility functions.

use crate::error::Result;
use serde::Serialize;
use std::path::Path;

/// Read a UTF-8 text file into a string.
pub fn read_utf8_file(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Write a slice of records as a pretty-printed JSON array.
///
/// Whole-file write; the output is meant to be human-readable as well as
/// machine-consumed.
pub fn write_json_file<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    Ok(())
}
