//! Verify command implementation.

use lineidx_core::{verify_table, TablePaths};
use std::path::Path;

/// Runs the verify command.
pub fn run(table: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let paths = TablePaths::new(table);
    println!("Verifying table at {:?}", paths.data());
    println!();

    let report = verify_table(&paths)?;
    println!("  Rows:          {}", report.rows);
    println!("  Data size:     {} bytes", report.data_len);
    println!("  Indexed bytes: {}", report.indexed_len);
    if let Some(arity) = report.arity {
        println!("  Fields:        {arity}");
    }
    for issue in &report.issues {
        println!("    ERROR: {issue}");
    }

    println!();
    if report.is_ok() {
        println!("✓ Table verification passed");
        Ok(())
    } else {
        println!("✗ Table verification failed");
        Err("Verification failed".into())
    }
}
