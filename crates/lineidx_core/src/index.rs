//! The line index: one decimal byte offset per line.

use crate::error::{TableError, TableResult};
use lineidx_storage::StorageBackend;

/// A parsed index file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    /// Offsets of every complete index line, in row order.
    pub offsets: Vec<u64>,
    /// Length in bytes of the complete lines (excludes a torn tail).
    pub complete_len: u64,
    /// Whether the file ends with an entry that has no terminating newline.
    pub torn_tail: bool,
}

impl LineIndex {
    /// Parses index bytes.
    ///
    /// A final entry without a newline is not counted: an interrupted append
    /// may have written only part of it.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Corrupted`] if a complete line is not a decimal
    /// `u64`.
    pub fn parse(bytes: &[u8]) -> TableResult<Self> {
        let mut offsets = Vec::new();
        let mut complete_len = 0u64;
        let mut rest = bytes;

        while let Some(end) = rest.iter().position(|&b| b == b'\n') {
            let entry = &rest[..end];
            let offset = std::str::from_utf8(entry)
                .ok()
                .map(str::trim)
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| {
                    TableError::corrupted(format!(
                        "index line {} is not an offset: {:?}",
                        offsets.len(),
                        String::from_utf8_lossy(entry)
                    ))
                })?;
            offsets.push(offset);
            complete_len += end as u64 + 1;
            rest = &rest[end + 1..];
        }

        Ok(Self {
            offsets,
            complete_len,
            torn_tail: !rest.is_empty(),
        })
    }

    /// Reads and parses an entire index backend.
    ///
    /// # Errors
    ///
    /// Returns a storage error or [`TableError::Corrupted`].
    pub fn load(backend: &dyn StorageBackend) -> TableResult<Self> {
        Self::parse(&read_all(backend)?)
    }

    /// Number of complete entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns true if the index holds no complete entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Reads the whole content of an index backend.
pub(crate) fn read_all(backend: &dyn StorageBackend) -> TableResult<Vec<u8>> {
    let size = backend.size()?;
    let len = usize::try_from(size)
        .map_err(|_| TableError::corrupted(format!("index of {size} bytes is too large")))?;
    Ok(backend.read_at(0, len)?)
}

/// Byte length of the first `entries` complete lines of `bytes`, or `None`
/// if there are fewer.
pub(crate) fn entries_len(bytes: &[u8], entries: usize) -> Option<u64> {
    if entries == 0 {
        return Some(0);
    }
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'\n')
        .nth(entries - 1)
        .map(|(at, _)| at as u64 + 1)
}

/// Appends the index line for `offset` to `out`.
pub fn push_entry(out: &mut String, offset: u64) {
    out.push_str(&offset.to_string());
    out.push('\n');
}
