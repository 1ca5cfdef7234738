//! Recover command implementation.

use lineidx_core::{AppendConfig, TableAppender, TablePaths};
use std::path::Path;

/// Bytes removed by a recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverResult {
    /// Rows kept.
    pub rows: usize,
    /// Data bytes removed past the last indexed row.
    pub data_removed: u64,
    /// Index bytes removed.
    pub index_removed: u64,
}

/// Runs the recover command.
pub fn run(table: &Path) -> Result<RecoverResult, Box<dyn std::error::Error>> {
    let paths = TablePaths::new(table);
    if !paths.data().exists() {
        return Err(format!("No table found at {:?}", paths.data()).into());
    }

    let result = recover(&paths)?;
    println!("Recovered {:?}", paths.data());
    println!("  Rows kept:           {}", result.rows);
    println!("  Data bytes removed:  {}", result.data_removed);
    println!("  Index bytes removed: {}", result.index_removed);
    Ok(result)
}

fn recover(paths: &TablePaths) -> Result<RecoverResult, Box<dyn std::error::Error>> {
    let data_before = file_len(paths.data())?;
    let index_before = file_len(paths.index())?;

    let summary = TableAppender::reopen(paths, AppendConfig::default())?.finish()?;

    Ok(RecoverResult {
        rows: summary.rows,
        data_removed: data_before.saturating_sub(file_len(paths.data())?),
        index_removed: index_before.saturating_sub(file_len(paths.index())?),
    })
}

fn file_len(path: &Path) -> std::io::Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}
