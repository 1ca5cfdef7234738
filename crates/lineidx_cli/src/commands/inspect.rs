//! Inspect command implementation.

use lineidx_core::{TablePaths, TableReader};
use serde::Serialize;
use std::path::Path;

/// Longest field printed in text mode before eliding.
const TEXT_FIELD_LIMIT: usize = 96;

/// Table inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data file path.
    pub path: String,
    /// Index file path.
    pub index_path: String,
    /// Indexed rows.
    pub rows: usize,
    /// Data file size in bytes.
    pub data_size: u64,
    /// Field count of the first row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arity: Option<usize>,
    /// Average line length in bytes.
    pub avg_row_size: u64,
}

/// A single row.
#[derive(Debug, Serialize)]
pub struct RowResult {
    /// Row number.
    pub row: usize,
    /// Byte offset of the line.
    pub offset: u64,
    /// Trimmed fields.
    pub fields: Vec<String>,
}

/// Runs the inspect command.
pub fn run(table: &Path, row: Option<usize>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let paths = TablePaths::new(table);
    let reader = TableReader::open_paths(&paths)?;

    if let Some(row) = row {
        let result = RowResult {
            row,
            fields: reader.read_row(row)?,
            offset: reader.offsets()[row],
        };
        match format {
            "json" => println!("{}", serde_json::to_string_pretty(&result)?),
            _ => print_row(&result),
        }
        return Ok(());
    }

    let result = inspect(&paths, &reader)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }
    Ok(())
}

fn inspect(paths: &TablePaths, reader: &TableReader) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let data_size = std::fs::metadata(paths.data())?.len();
    let arity = if reader.row_count() > 0 {
        Some(reader.read_row(0)?.len())
    } else {
        None
    };
    let avg_row_size = match reader.row_count() {
        0 => 0,
        rows => data_size / rows as u64,
    };

    Ok(InspectResult {
        path: paths.data().display().to_string(),
        index_path: paths.index().display().to_string(),
        rows: reader.row_count(),
        data_size,
        arity,
        avg_row_size,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("lineidx Table Inspection");
    println!("========================");
    println!();
    println!("Data:  {}", result.path);
    println!("Index: {}", result.index_path);
    println!();
    println!("Rows:          {}", result.rows);
    if let Some(arity) = result.arity {
        println!("Fields:        {arity}");
    }
    println!("Data size:     {}", format_size(result.data_size));
    println!("Avg row size:  {}", format_size(result.avg_row_size));
}

fn print_row(result: &RowResult) {
    println!("Row {} @ offset {}", result.row, result.offset);
    for (i, field) in result.fields.iter().enumerate() {
        println!("  [{i}] {}", elide(field, TEXT_FIELD_LIMIT));
    }
}

fn elide(field: &str, limit: usize) -> String {
    match field.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}... ({} bytes)", &field[..cut], field.len()),
        None => field.to_string(),
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
