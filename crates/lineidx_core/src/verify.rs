//! Consistency check of a table's data and index files.

use crate::error::{TableError, TableResult};
use crate::index::LineIndex;
use crate::paths::TablePaths;
use crate::reader::split_fields;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Issues recorded before verification stops listing them.
const MAX_ISSUES: usize = 64;

/// Result of [`verify_table`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Indexed rows.
    pub rows: usize,
    /// Size of the data file.
    pub data_len: u64,
    /// Bytes covered by indexed rows.
    pub indexed_len: u64,
    /// Field count of the first row.
    pub arity: Option<usize>,
    /// Human-readable problems, empty for a consistent table.
    pub issues: Vec<String>,
}

impl VerifyReport {
    /// Returns true if no issue was found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    fn issue(&mut self, message: String) {
        if self.issues.len() < MAX_ISSUES {
            self.issues.push(message);
        }
    }
}

/// Checks that every index entry starts exactly where the previous line
/// ended, that every indexed line is newline-terminated and that all rows
/// share one arity.
///
/// Data past the last indexed row is reported as an issue: it is the
/// signature of an interrupted append.
///
/// # Errors
///
/// Returns an I/O error if either file cannot be read. Inconsistencies are
/// reported in [`VerifyReport::issues`], not as errors.
pub fn verify_table(paths: &TablePaths) -> TableResult<VerifyReport> {
    let index_bytes = std::fs::read(paths.index())?;
    let data = File::open(paths.data())?;

    let mut report = VerifyReport {
        data_len: data.metadata()?.len(),
        ..VerifyReport::default()
    };

    let index = match LineIndex::parse(&index_bytes) {
        Ok(index) => index,
        Err(TableError::Corrupted { message }) => {
            report.issue(message);
            return Ok(report);
        }
        Err(err) => return Err(err),
    };
    if index.torn_tail {
        report.issue("index ends with a torn entry".to_string());
    }
    report.rows = index.len();

    let mut data = BufReader::new(data);
    let mut pos = 0u64;
    let mut line = Vec::new();

    for (row, &offset) in index.offsets.iter().enumerate() {
        if offset != pos {
            report.issue(format!(
                "row {row}: index says offset {offset}, previous line ended at {pos}"
            ));
            return Ok(report);
        }

        line.clear();
        let read = data.read_until(b'\n', &mut line)?;
        if read == 0 {
            report.issue(format!("row {row}: offset {offset} is at or past end of data"));
            return Ok(report);
        }
        if line.last() != Some(&b'\n') {
            report.issue(format!("row {row}: line is not newline-terminated"));
        }
        pos += read as u64;

        let arity = split_fields(&String::from_utf8_lossy(&line)).len();
        match report.arity {
            None => report.arity = Some(arity),
            Some(expected) if expected != arity => {
                report.issue(format!("row {row}: {arity} fields, expected {expected}"));
            }
            Some(_) => {}
        }
    }

    report.indexed_len = pos;
    if report.data_len > pos {
        report.issue(format!(
            "{} unindexed bytes after the last row",
            report.data_len - pos
        ));
    }
    Ok(report)
}
