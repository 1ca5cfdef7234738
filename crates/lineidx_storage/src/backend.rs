//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};

/// Chunk size used by [`StorageBackend::read_until`] when scanning forward.
pub const SCAN_CHUNK_SIZE: usize = 64 * 1024;

/// An append-only byte store.
///
/// Backends are **opaque**: they do not know that the bytes they hold are
/// tab-separated lines or decimal offsets.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `sync` makes all appended data durable
/// - `truncate` only ever shrinks
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`] if the range extends past the
    /// current size, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is read-only or an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes down to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// This is the offset where the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Truncates the storage to `new_size` bytes.
    ///
    /// Used to cut off a torn tail left behind by an interrupted append.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TruncatePastEnd`] if `new_size` is greater
    /// than the current size, or an I/O error.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Reads from `offset` up to and including the first `delim` byte.
    ///
    /// If no delimiter is found before the end of storage, everything from
    /// `offset` to the end is returned. Scans in [`SCAN_CHUNK_SIZE`] chunks so
    /// memory stays bounded by the distance to the delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`] if `offset` is past the end.
    fn read_until(&self, offset: u64, delim: u8) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        if offset > size {
            return Err(StorageError::ReadPastEnd {
                offset,
                len: 0,
                size,
            });
        }

        let mut out = Vec::new();
        let mut pos = offset;
        while pos < size {
            let len = usize::try_from(size - pos).unwrap_or(usize::MAX).min(SCAN_CHUNK_SIZE);
            let chunk = self.read_at(pos, len)?;
            if let Some(i) = chunk.iter().position(|&b| b == delim) {
                out.extend_from_slice(&chunk[..=i]);
                return Ok(out);
            }
            out.extend_from_slice(&chunk);
            pos += len as u64;
        }
        Ok(out)
    }
}
