use std::path::Path;

use tracing::debug;

use super::table::Table;
use crate::error::EfiscenError;

/// Tables switched on in a selection file's contents.
///
/// Each line reads `<table key> <0|1>`. Unknown keys and lines whose value
/// is not `1` are skipped. Tables come back in file order without repeats.
pub fn parse_selection(content: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        if value != "1" {
            continue;
        }
        match Table::from_key(key) {
            Some(table) if !tables.contains(&table) => tables.push(table),
            Some(_) => {}
            None => debug!(key, "ignoring unknown table key"),
        }
    }
    tables
}

/// Read a selection file.
///
/// A missing file is an IO error. A file whose first line is empty or
/// absent aborts the export.
pub fn read_selection_file(path: impl AsRef<Path>) -> Result<Vec<Table>, EfiscenError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let first = content.lines().next().unwrap_or("");
    if first.trim().is_empty() {
        return Err(EfiscenError::SessionAborted(format!(
            "selection file {} has no first line",
            path.display()
        )));
    }
    Ok(parse_selection(&content))
}
