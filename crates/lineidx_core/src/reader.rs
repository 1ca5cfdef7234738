//! Random-access and streaming reads of a published table.

use crate::error::{TableError, TableResult};
use crate::field::{FIELD_SEPARATOR, LINE_TERMINATOR};
use crate::index::LineIndex;
use crate::paths::TablePaths;
use lineidx_storage::{FileBackend, StorageBackend, SCAN_CHUNK_SIZE};
use std::path::Path;

/// Reads rows of a table by row number.
///
/// The index is loaded into memory once; every row read is a single
/// positioned read into the data file. Neither file is ever modified.
///
/// # Example
///
/// ```no_run
/// use lineidx_core::TableReader;
///
/// let reader = TableReader::open("out/train.label.tsv").unwrap();
/// let fields = reader.read_row(0).unwrap();
/// println!("image {} has labels {}", fields[0], fields[1]);
/// ```
#[derive(Debug)]
pub struct TableReader<B: StorageBackend = FileBackend> {
    offsets: Vec<u64>,
    data: B,
}

impl TableReader<FileBackend> {
    /// Opens the table whose data file is `data`, deriving the index path.
    ///
    /// # Errors
    ///
    /// Returns an error if either file is missing or the index is corrupted.
    pub fn open(data: impl AsRef<Path>) -> TableResult<Self> {
        Self::open_paths(&TablePaths::new(data.as_ref()))
    }

    /// Opens a table from explicit paths.
    ///
    /// # Errors
    ///
    /// Returns an error if either file is missing or the index is corrupted.
    pub fn open_paths(paths: &TablePaths) -> TableResult<Self> {
        let index = FileBackend::open_read_only(paths.index())?;
        let data = FileBackend::open_read_only(paths.data())?;
        Self::from_backends(&index, data)
    }
}

impl<B: StorageBackend> TableReader<B> {
    /// Builds a reader over arbitrary backends.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Corrupted`] if the index cannot be parsed or
    /// points past the end of the data.
    pub fn from_backends(index: &dyn StorageBackend, data: B) -> TableResult<Self> {
        let index = LineIndex::load(index)?;
        let data_len = data.size()?;
        if let Some(&last) = index.offsets.last() {
            if last >= data_len {
                return Err(TableError::corrupted(format!(
                    "last offset {last} is past data end {data_len}"
                )));
            }
        }
        Ok(Self {
            offsets: index.offsets,
            data,
        })
    }

    /// Number of indexed rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.offsets.len()
    }

    /// Byte offsets of every row.
    #[must_use]
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Returns the raw line of `row` without its terminating newline.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::OutOfRange`] if `row >= row_count()`,
    /// [`TableError::Corrupted`] if the line is not newline-terminated where
    /// the index says it ends, or [`TableError::MalformedInput`] for
    /// non-UTF-8 content.
    pub fn read_line(&self, row: usize) -> TableResult<String> {
        let start = *self.offsets.get(row).ok_or(TableError::OutOfRange {
            row,
            row_count: self.row_count(),
        })?;

        let bytes = match self.offsets.get(row + 1) {
            Some(&next) => {
                let len = next.checked_sub(start).ok_or_else(|| {
                    TableError::corrupted(format!("offsets decrease at row {row}"))
                })?;
                self.data.read_at(start, to_len(len)?)?
            }
            None => self.data.read_until(start, b'\n')?,
        };

        decode_line(row, bytes)
    }

    /// Returns the fields of `row`, split on tab and trimmed.
    ///
    /// # Errors
    ///
    /// See [`TableReader::read_line`].
    pub fn read_row(&self, row: usize) -> TableResult<Vec<String>> {
        Ok(split_fields(&self.read_line(row)?))
    }

    /// Streams every indexed row in order.
    ///
    /// Reads the data file front to back in large chunks instead of one
    /// positioned read per row. Bytes after the last indexed row are never
    /// returned.
    #[must_use]
    pub fn rows(&self) -> Rows<'_, B> {
        Rows {
            reader: self,
            next: 0,
            buffer: Vec::new(),
            buffer_start: 0,
        }
    }
}

/// Iterator returned by [`TableReader::rows`].
#[derive(Debug)]
pub struct Rows<'a, B: StorageBackend> {
    reader: &'a TableReader<B>,
    next: usize,
    buffer: Vec<u8>,
    buffer_start: u64,
}

impl<B: StorageBackend> Rows<'_, B> {
    fn line(&mut self, row: usize) -> TableResult<String> {
        let offsets = &self.reader.offsets;
        let Some(&end) = offsets.get(row + 1) else {
            return self.reader.read_line(row);
        };
        let start = offsets[row];
        // The last row is read on its own, so refills stop at its start.
        let limit = offsets[offsets.len() - 1];
        if end < start || end > limit {
            return Err(TableError::corrupted(format!("offsets decrease at row {row}")));
        }

        let buffer_end = self.buffer_start + self.buffer.len() as u64;
        if start < self.buffer_start || end > buffer_end {
            let want = (end - start).max(SCAN_CHUNK_SIZE as u64).min(limit - start);
            self.buffer = self.reader.data.read_at(start, to_len(want)?)?;
            self.buffer_start = start;
        }

        let from = to_len(start - self.buffer_start)?;
        let to = to_len(end - self.buffer_start)?;
        decode_line(row, self.buffer[from..to].to_vec())
    }
}

impl<B: StorageBackend> Iterator for Rows<'_, B> {
    type Item = TableResult<(usize, Vec<String>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.next;
        if row >= self.reader.row_count() {
            return None;
        }
        self.next += 1;

        match self.line(row) {
            Ok(line) => Some(Ok((row, split_fields(&line)))),
            Err(err) => {
                self.next = self.reader.row_count();
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.reader.row_count().saturating_sub(self.next);
        (left, Some(left))
    }
}

fn to_len(len: u64) -> TableResult<usize> {
    usize::try_from(len).map_err(|_| TableError::corrupted(format!("line of {len} bytes")))
}

fn decode_line(row: usize, mut bytes: Vec<u8>) -> TableResult<String> {
    if bytes.pop() != Some(LINE_TERMINATOR as u8) {
        return Err(TableError::corrupted(format!(
            "row {row} is not newline-terminated"
        )));
    }
    String::from_utf8(bytes).map_err(|e| TableError::malformed(row, e.to_string()))
}

/// Splits a line into trimmed fields.
#[must_use]
pub fn split_fields(line: &str) -> Vec<String> {
    line.split(FIELD_SEPARATOR)
        .map(|f| f.trim().to_owned())
        .collect()
}
