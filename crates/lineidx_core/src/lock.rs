//! Advisory single-writer lock on a table.

use crate::error::{TableError, TableResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Exclusive advisory lock held on a table's data file.
///
/// Released when dropped. Only cooperating lineidx appenders honour it;
/// readers never take it.
#[derive(Debug)]
pub(crate) struct TableLock {
    _file: File,
}

impl TableLock {
    /// Locks the data file at `path`, creating it if needed.
    ///
    /// Returns [`TableError::TableLocked`] if another appender holds it.
    pub(crate) fn acquire(path: &Path) -> TableResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(TableError::TableLocked {
                path: path.display().to_string(),
            });
        }

        Ok(Self { _file: file })
    }
}
