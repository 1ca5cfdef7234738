//! File naming conventions for a row table.
//!
//! ```text
//! <dir>/
//! ├─ train.label.tsv          # data: one tab-separated record per line
//! ├─ train.label.lineidx      # index: decimal byte offset of each line
//! └─ train.label.linelist.tsv # derived selection list (arity 1)
//! ```

use crate::error::{TableError, TableResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension of the index file.
pub const INDEX_EXTENSION: &str = "lineidx";

/// Suffix of a derived selection list.
pub const LINELIST_SUFFIX: &str = ".linelist.tsv";

/// Suffix appended to a full path while a bulk write is in progress.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Data and index paths of one row table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    data: PathBuf,
    index: PathBuf,
}

impl TablePaths {
    /// Derives the index path from the data path by replacing its extension
    /// with `lineidx` (`train.tsv` → `train.lineidx`, `P` → `P.lineidx`).
    pub fn new(data: impl Into<PathBuf>) -> Self {
        let data = data.into();
        let index = data.with_extension(INDEX_EXTENSION);
        Self { data, index }
    }

    /// Uses explicit data and index paths.
    pub fn with_index(data: impl Into<PathBuf>, index: impl Into<PathBuf>) -> Self {
        Self {
            data: data.into(),
            index: index.into(),
        }
    }

    /// Checks that data and index name different files.
    ///
    /// `TablePaths::new("t.lineidx")` derives an index equal to its data
    /// path; writing such a table would interleave both files.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidInput`] if the two paths are equal.
    pub fn ensure_distinct(&self) -> TableResult<()> {
        if self.data == self.index {
            return Err(TableError::invalid_input(format!(
                "{} is both the data and the index path",
                self.data.display()
            )));
        }
        Ok(())
    }

    /// Returns the data file path.
    #[must_use]
    pub fn data(&self) -> &Path {
        &self.data
    }

    /// Returns the index file path.
    #[must_use]
    pub fn index(&self) -> &Path {
        &self.index
    }

    /// Returns the temporary paths used while bulk writing this table.
    #[must_use]
    pub fn temp(&self) -> Self {
        Self {
            data: with_suffix(&self.data, TEMP_SUFFIX),
            index: with_suffix(&self.index, TEMP_SUFFIX),
        }
    }

    /// Returns the default selection-list table for this (label) table:
    /// the data path with its extension replaced by `.linelist.tsv`.
    #[must_use]
    pub fn linelist(&self) -> Self {
        let stem = self.data.with_extension("");
        Self::new(with_suffix(&stem, LINELIST_SUFFIX))
    }

    /// Returns the directory holding the data file, if the path names one.
    #[must_use]
    pub fn parent_dir(&self) -> Option<&Path> {
        self.data.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
