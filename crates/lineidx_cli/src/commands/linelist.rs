//! Linelist command implementation.

use lineidx_core::{build_linelist, LinelistSummary, SelectionConfig, TablePaths};
use std::path::Path;

/// Runs the linelist command.
pub fn run(
    labels: &Path,
    output: Option<&Path>,
    ignore_attrs: Vec<String>,
    label_field: usize,
) -> Result<LinelistSummary, Box<dyn std::error::Error>> {
    let config = SelectionConfig::new()
        .label_field(label_field)
        .ignore_attrs(ignore_attrs);
    let save = output.map(TablePaths::new);

    let summary = build_linelist(&TablePaths::new(labels), save.as_ref(), &config)?;
    println!(
        "Selected {} of {} rows -> {}",
        summary.selected,
        summary.source_rows,
        summary.paths.data().display()
    );
    Ok(summary)
}
