//! One-shot bulk writer.
//!
//! The table is written to `<data>.tmp` / `<index>.tmp` and published with
//! a rename of each file, so a reader never opens a half-written table:
//!
//! 1. Write every line and its offset to the temporary pair
//! 2. Sync both temporary files
//! 3. Rename data, then index, into place
//! 4. Fsync the parent directory so the renames are durable
//!
//! If the index rename fails, the freshly renamed data file is removed
//! again so no data file is left beside a stale or missing index.

use crate::error::{TableError, TableResult};
use crate::field::{ArityGuard, Record};
use crate::index::push_entry;
use crate::paths::TablePaths;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of a bulk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// Number of rows written.
    pub rows: usize,
    /// Size of the data file in bytes.
    pub data_len: u64,
}

/// Writes `records` as a complete table at `paths`.
///
/// Parent directories are created if missing.
///
/// # Errors
///
/// Returns [`TableError::InvalidInput`] for an empty record, a record whose
/// arity differs from the first one, or a text field containing a tab or
/// newline, or for paths whose data and index are the same file. I/O
/// failures are returned as-is. On any error nothing new is left published
/// and the temporary files are removed.
///
/// # Example
///
/// ```no_run
/// use lineidx_core::{write_table, Field, Record, TablePaths};
///
/// let paths = TablePaths::new("out/train.hw.tsv");
/// let rows = vec![Record::new(vec![Field::Int(1), Field::text("[]")])];
/// write_table(&paths, rows).unwrap();
/// ```
pub fn write_table<I>(paths: &TablePaths, records: I) -> TableResult<WriteSummary>
where
    I: IntoIterator<Item = Record>,
{
    try_write_table(paths, records.into_iter().map(Ok))
}

/// Like [`write_table`], but pulls records from a fallible source.
///
/// The first `Err` from `records` aborts the write and is returned.
///
/// # Errors
///
/// See [`write_table`].
pub fn try_write_table<I>(paths: &TablePaths, records: I) -> TableResult<WriteSummary>
where
    I: IntoIterator<Item = TableResult<Record>>,
{
    paths.ensure_distinct()?;
    if let Some(parent) = paths.parent_dir() {
        fs::create_dir_all(parent)?;
    }

    let temp = paths.temp();
    let summary = match write_temp(&temp, records) {
        Ok(summary) => summary,
        Err(err) => {
            discard(&temp);
            return Err(err);
        }
    };

    if let Err(err) = fs::rename(temp.data(), paths.data()) {
        discard(&temp);
        return Err(err.into());
    }
    if let Err(err) = fs::rename(temp.index(), paths.index()) {
        warn!(
            path = %paths.data().display(),
            error = %err,
            "index rename failed, withdrawing data"
        );
        let _ = fs::remove_file(paths.data());
        discard(&temp);
        return Err(err.into());
    }
    sync_dir(paths.parent_dir())?;

    debug!(
        path = %paths.data().display(),
        rows = summary.rows,
        bytes = summary.data_len,
        "published table"
    );
    Ok(summary)
}

fn write_temp<I>(temp: &TablePaths, records: I) -> TableResult<WriteSummary>
where
    I: IntoIterator<Item = TableResult<Record>>,
{
    let mut data = BufWriter::new(File::create(temp.data())?);
    let mut index = BufWriter::new(File::create(temp.index())?);

    let mut guard = ArityGuard::default();
    let mut offset = 0u64;
    let mut rows = 0usize;
    let mut entry = String::new();

    for record in records {
        let record = record?;
        guard.check(&record)?;
        let line = record.encode_line()?;

        entry.clear();
        push_entry(&mut entry, offset);
        index.write_all(entry.as_bytes())?;
        data.write_all(line.as_bytes())?;

        offset += line.len() as u64;
        rows += 1;
    }

    let data = data.into_inner().map_err(|e| e.into_error())?;
    let index = index.into_inner().map_err(|e| e.into_error())?;
    data.sync_all()?;
    index.sync_all()?;

    Ok(WriteSummary {
        rows,
        data_len: offset,
    })
}

fn discard(temp: &TablePaths) {
    let _ = fs::remove_file(temp.data());
    let _ = fs::remove_file(temp.index());
}

/// Fsyncs a directory so renames inside it survive a crash.
#[cfg(unix)]
pub(crate) fn sync_dir(dir: Option<&Path>) -> TableResult<()> {
    let dir = dir.unwrap_or_else(|| Path::new("."));
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn sync_dir(_dir: Option<&Path>) -> TableResult<()> {
    // NTFS journals metadata; directory handles cannot be fsynced.
    Ok(())
}
