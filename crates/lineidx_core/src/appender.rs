//! Incremental appends with bounded memory.
//!
//! A [`TableAppender`] owns the cursor of one table: the lines pushed since
//! the last flush and the byte offset where the next line will start. A
//! flush appends the pending lines to the data file and only then appends
//! their offsets to the index, so the index never points at bytes that are
//! not there.
//!
//! # Provisional tables
//!
//! Appends are not atomic. A flush that fails between the data append and
//! the index append leaves data bytes with no index entries; the reader
//! ignores them, but the table must be treated as provisional until the
//! producer finishes. A failed appender refuses further work.
//! [`TableAppender::reopen`] cuts such a tail off and resumes.

use crate::config::AppendConfig;
use crate::error::{TableError, TableResult};
use crate::field::{ArityGuard, Record};
use crate::index::{entries_len, push_entry, read_all, LineIndex};
use crate::lock::TableLock;
use crate::paths::TablePaths;
use crate::reader::split_fields;
use crate::writer::{sync_dir, WriteSummary};
use lineidx_storage::{FileBackend, StorageBackend};
use std::fmt;
use tracing::{debug, warn};

/// Lifecycle of an appender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppenderState {
    /// Accepting pushes and flushes.
    Open,
    /// Finished; every row is flushed and synced.
    Finished,
    /// A flush failed; the table tail may be inconsistent.
    Failed,
}

/// Appends records to one table in batches.
pub struct TableAppender<B: StorageBackend = FileBackend> {
    name: String,
    data: B,
    index: B,
    pending: Vec<String>,
    next_offset: u64,
    rows_written: usize,
    arity: ArityGuard,
    state: AppenderState,
    config: AppendConfig,
    _lock: Option<TableLock>,
}

impl<B: StorageBackend> fmt::Debug for TableAppender<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableAppender")
            .field("name", &self.name)
            .field("pending", &self.pending.len())
            .field("next_offset", &self.next_offset)
            .field("rows_written", &self.rows_written)
            .field("state", &self.state)
            .finish()
    }
}

impl TableAppender<FileBackend> {
    /// Starts a new, empty table at `paths`.
    ///
    /// Existing files at those paths are truncated. Parent directories are
    /// created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::TableLocked`] if another appender owns the
    /// table, [`TableError::InvalidInput`] if data and index are the same
    /// path, or an I/O error.
    pub fn create(paths: &TablePaths, config: AppendConfig) -> TableResult<Self> {
        let (lock, data, index) = open_files(paths)?;
        let mut appender = Self::with_backends(display_name(paths), data, index, config)?;
        appender._lock = Some(lock);
        sync_dir(paths.parent_dir())?;
        Ok(appender)
    }

    /// Reopens an existing table and resumes appending after its last
    /// indexed row.
    ///
    /// Missing files are treated as an empty table. A torn index entry and
    /// any data bytes past the last indexed line are truncated away.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Corrupted`] if the index points past the data,
    /// [`TableError::TableLocked`], or an I/O error.
    pub fn reopen(paths: &TablePaths, config: AppendConfig) -> TableResult<Self> {
        let (lock, data, index) = open_files(paths)?;
        let mut appender = Self::recover_backends(display_name(paths), data, index, config)?;
        appender._lock = Some(lock);
        Ok(appender)
    }
}

fn display_name(paths: &TablePaths) -> String {
    paths.data().display().to_string()
}

fn open_files(paths: &TablePaths) -> TableResult<(TableLock, FileBackend, FileBackend)> {
    paths.ensure_distinct()?;
    let data = FileBackend::open_with_create_dirs(paths.data())?;
    let index = FileBackend::open_with_create_dirs(paths.index())?;
    let lock = TableLock::acquire(paths.data())?;
    Ok((lock, data, index))
}

impl<B: StorageBackend> TableAppender<B> {
    /// Starts a new table over the given backends, discarding their content.
    ///
    /// # Errors
    ///
    /// Returns an error if the backends cannot be truncated.
    pub fn with_backends(
        name: impl Into<String>,
        mut data: B,
        mut index: B,
        config: AppendConfig,
    ) -> TableResult<Self> {
        data.truncate(0)?;
        index.truncate(0)?;
        Ok(Self::assemble(name.into(), data, index, config, 0, 0, None))
    }

    /// Resumes a table over the given backends.
    ///
    /// # Errors
    ///
    /// See [`TableAppender::reopen`].
    pub fn recover_backends(
        name: impl Into<String>,
        mut data: B,
        mut index: B,
        config: AppendConfig,
    ) -> TableResult<Self> {
        let name = name.into();
        let parsed = LineIndex::load(&index)?;
        if parsed.torn_tail {
            warn!(table = %name, keep = parsed.complete_len, "dropping torn index entry");
            index.truncate(parsed.complete_len)?;
        }

        let data_len = data.size()?;
        let (end, arity) = match parsed.offsets.last() {
            None => (0, None),
            Some(&last) => {
                if last >= data_len {
                    return Err(TableError::corrupted(format!(
                        "{name}: last offset {last} is past data end {data_len}"
                    )));
                }
                let mut line = data.read_until(last, b'\n')?;
                if line.pop() != Some(b'\n') {
                    return Err(TableError::corrupted(format!(
                        "{name}: last indexed row is not newline-terminated"
                    )));
                }
                let arity = split_fields(&String::from_utf8_lossy(&line)).len();
                (last + line.len() as u64 + 1, Some(arity))
            }
        };

        if data_len > end {
            warn!(
                table = %name,
                unindexed = data_len - end,
                "truncating data written after the last indexed row"
            );
            data.truncate(end)?;
        }

        debug!(table = %name, rows = parsed.len(), next_offset = end, "resumed table");
        Ok(Self::assemble(
            name,
            data,
            index,
            config,
            end,
            parsed.len(),
            arity,
        ))
    }

    fn assemble(
        name: String,
        data: B,
        index: B,
        config: AppendConfig,
        next_offset: u64,
        rows_written: usize,
        arity: Option<usize>,
    ) -> Self {
        Self {
            name,
            data,
            index,
            pending: Vec::new(),
            next_offset,
            rows_written,
            arity: ArityGuard::with_arity(arity),
            state: AppenderState::Open,
            config,
            _lock: None,
        }
    }

    /// Buffers a record until the next flush.
    ///
    /// The record is rendered immediately, so invalid fields are rejected
    /// here and never reach the file.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidState`] once the appender is finished or
    /// failed, or [`TableError::InvalidInput`] for an invalid record.
    pub fn push(&mut self, record: &Record) -> TableResult<()> {
        self.ensure_open()?;
        let line = record.encode_line()?;
        self.arity.check(record)?;
        self.pending.push(line);
        Ok(())
    }

    /// Appends every buffered record to the table.
    ///
    /// Returns the number of rows flushed.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidState`] once the appender is finished or
    /// failed. Any storage failure marks the appender failed.
    pub fn flush(&mut self) -> TableResult<usize> {
        self.ensure_open()?;
        if self.pending.is_empty() {
            return Ok(0);
        }

        match self.write_pending() {
            Ok(count) => Ok(count),
            Err(err) => {
                self.state = AppenderState::Failed;
                Err(err)
            }
        }
    }

    fn write_pending(&mut self) -> TableResult<usize> {
        let mut data_buf = String::with_capacity(self.pending.iter().map(String::len).sum());
        let mut index_buf = String::new();
        let mut offset = self.next_offset;
        for line in &self.pending {
            push_entry(&mut index_buf, offset);
            data_buf.push_str(line);
            offset += line.len() as u64;
        }

        let at = self.data.append(data_buf.as_bytes())?;
        if at != self.next_offset {
            return Err(TableError::corrupted(format!(
                "{}: data grew outside this appender (expected end {}, found {at})",
                self.name, self.next_offset
            )));
        }
        self.settle_data()?;
        self.index.append(index_buf.as_bytes())?;
        self.settle_index()?;

        let count = self.pending.len();
        self.pending.clear();
        self.next_offset = offset;
        self.rows_written += count;

        debug!(
            table = %self.name,
            rows = count,
            total = self.rows_written,
            next_offset = offset,
            "flushed batch"
        );
        Ok(count)
    }

    fn settle_data(&mut self) -> TableResult<()> {
        if self.config.sync_on_flush {
            self.data.sync()?;
        } else {
            self.data.flush()?;
        }
        Ok(())
    }

    fn settle_index(&mut self) -> TableResult<()> {
        if self.config.sync_on_flush {
            self.index.sync()?;
        } else {
            self.index.flush()?;
        }
        Ok(())
    }

    /// Flushes what is pending, syncs both files and closes the appender.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidState`] if already finished or failed,
    /// or the error of the final flush.
    pub fn finish(&mut self) -> TableResult<WriteSummary> {
        self.flush()?;
        let synced = self.data.sync().and_then(|()| self.index.sync());
        if let Err(err) = synced {
            self.state = AppenderState::Failed;
            return Err(err.into());
        }
        self.state = AppenderState::Finished;
        self._lock = None;

        debug!(table = %self.name, rows = self.rows_written, "finished table");
        Ok(WriteSummary {
            rows: self.rows_written,
            data_len: self.next_offset,
        })
    }

    /// Cuts the table back to its first `rows` rows.
    ///
    /// The index is shortened before the data, so an interrupted cut leaves
    /// an index that only points at bytes that exist.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidState`] unless the appender is open with
    /// nothing pending, [`TableError::InvalidInput`] if `rows` exceeds
    /// [`rows_written`](Self::rows_written), [`TableError::Corrupted`] if
    /// the index no longer matches the cursor, or an I/O error.
    pub fn truncate_rows(&mut self, rows: usize) -> TableResult<()> {
        self.ensure_open()?;
        if !self.pending.is_empty() {
            return Err(TableError::invalid_state(format!(
                "{}: cannot truncate with {} rows pending",
                self.name,
                self.pending.len()
            )));
        }
        if rows > self.rows_written {
            return Err(TableError::invalid_input(format!(
                "{}: cannot keep {rows} rows, table has {}",
                self.name, self.rows_written
            )));
        }
        if rows == self.rows_written {
            return Ok(());
        }

        let bytes = read_all(&self.index)?;
        let parsed = LineIndex::parse(&bytes)?;
        let (Some(&data_end), Some(index_end)) =
            (parsed.offsets.get(rows), entries_len(&bytes, rows))
        else {
            return Err(TableError::corrupted(format!(
                "{}: index holds {} entries, cursor expects {}",
                self.name,
                parsed.len(),
                self.rows_written
            )));
        };

        warn!(
            table = %self.name,
            from = self.rows_written,
            to = rows,
            "truncating rows"
        );
        let cut = self
            .index
            .truncate(index_end)
            .and_then(|()| self.data.truncate(data_end));
        if let Err(err) = cut {
            self.state = AppenderState::Failed;
            return Err(err.into());
        }

        self.rows_written = rows;
        self.next_offset = data_end;
        if rows == 0 {
            self.arity = ArityGuard::default();
        }
        Ok(())
    }

    fn ensure_open(&self) -> TableResult<()> {
        match self.state {
            AppenderState::Open => Ok(()),
            AppenderState::Finished => Err(TableError::invalid_state(format!(
                "{} is finished",
                self.name
            ))),
            AppenderState::Failed => Err(TableError::invalid_state(format!(
                "{} failed during a flush and must be recovered",
                self.name
            ))),
        }
    }

    /// Table name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of records waiting for the next flush.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of rows already flushed.
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Byte offset at which the next flushed row will start.
    #[must_use]
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AppenderState {
        self.state
    }

    /// Field count shared by all rows, once the first row is known.
    #[must_use]
    pub fn arity(&self) -> Option<usize> {
        self.arity.arity()
    }
}

/// Handle to a table registered with an [`Appender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(usize);

impl TableId {
    /// Returns the raw handle value.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table:{}", self.0)
    }
}

/// A set of tables filled side by side.
///
/// The driver pushes one record per table per source item and decides
/// when to flush; the appender holds no timer and never flushes on its own.
///
/// # Example
///
/// ```no_run
/// use lineidx_core::{AppendConfig, Appender, Field, Record, TablePaths};
///
/// let mut appender = Appender::new();
/// let labels = appender
///     .create_table(&TablePaths::new("out/train.label.tsv"), AppendConfig::default())
///     .unwrap();
/// appender
///     .push(labels, &Record::new(vec![Field::Int(1), Field::text("[]")]))
///     .unwrap();
/// appender.flush_all().unwrap();
/// appender.finish_all().unwrap();
/// ```
#[derive(Debug)]
pub struct Appender<B: StorageBackend = FileBackend> {
    tables: Vec<TableAppender<B>>,
}

impl<B: StorageBackend> Default for Appender<B> {
    fn default() -> Self {
        Self { tables: Vec::new() }
    }
}

impl Appender<FileBackend> {
    /// Creates an empty registry of file-backed tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new table and registers it.
    ///
    /// # Errors
    ///
    /// See [`TableAppender::create`].
    pub fn create_table(&mut self, paths: &TablePaths, config: AppendConfig) -> TableResult<TableId> {
        Ok(self.register(TableAppender::create(paths, config)?))
    }

    /// Reopens an existing table and registers it.
    ///
    /// # Errors
    ///
    /// See [`TableAppender::reopen`].
    pub fn reopen_table(&mut self, paths: &TablePaths, config: AppendConfig) -> TableResult<TableId> {
        Ok(self.register(TableAppender::reopen(paths, config)?))
    }
}

impl<B: StorageBackend> Appender<B> {
    /// Registers an already constructed table appender.
    pub fn register(&mut self, table: TableAppender<B>) -> TableId {
        self.tables.push(table);
        TableId(self.tables.len() - 1)
    }

    /// Returns the appender behind `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidInput`] for a handle not issued here.
    pub fn table(&self, id: TableId) -> TableResult<&TableAppender<B>> {
        self.tables
            .get(id.0)
            .ok_or_else(|| TableError::invalid_input(format!("unknown {id}")))
    }

    fn table_mut(&mut self, id: TableId) -> TableResult<&mut TableAppender<B>> {
        self.tables
            .get_mut(id.0)
            .ok_or_else(|| TableError::invalid_input(format!("unknown {id}")))
    }

    /// Buffers `record` for table `id`.
    ///
    /// # Errors
    ///
    /// See [`TableAppender::push`].
    pub fn push(&mut self, id: TableId, record: &Record) -> TableResult<()> {
        self.table_mut(id)?.push(record)
    }

    /// Flushes table `id`.
    ///
    /// # Errors
    ///
    /// See [`TableAppender::flush`].
    pub fn flush(&mut self, id: TableId) -> TableResult<usize> {
        self.table_mut(id)?.flush()
    }

    /// Flushes every table in registration order, stopping at the first
    /// failure.
    ///
    /// # Errors
    ///
    /// See [`TableAppender::flush`].
    pub fn flush_all(&mut self) -> TableResult<()> {
        for table in &mut self.tables {
            table.flush()?;
        }
        Ok(())
    }

    /// Finishes table `id`.
    ///
    /// # Errors
    ///
    /// See [`TableAppender::finish`].
    pub fn finish(&mut self, id: TableId) -> TableResult<WriteSummary> {
        self.table_mut(id)?.finish()
    }

    /// Cuts every table back to the row count of the shortest one, so that
    /// row `i` refers to the same source item in all of them.
    ///
    /// Returns the common row count.
    ///
    /// # Errors
    ///
    /// See [`TableAppender::truncate_rows`].
    pub fn align_rows(&mut self) -> TableResult<usize> {
        let Some(rows) = self.tables.iter().map(TableAppender::rows_written).min() else {
            return Ok(0);
        };
        for table in &mut self.tables {
            table.truncate_rows(rows)?;
        }
        Ok(rows)
    }

    /// Finishes every table still open.
    ///
    /// # Errors
    ///
    /// Returns the first error of [`TableAppender::finish`], or
    /// [`TableError::InvalidState`] if any table had failed. Open tables are
    /// finished before a failed one is reported.
    pub fn finish_all(&mut self) -> TableResult<Vec<WriteSummary>> {
        let summaries = self
            .tables
            .iter_mut()
            .filter(|t| t.state() == AppenderState::Open)
            .map(TableAppender::finish)
            .collect::<TableResult<Vec<_>>>()?;

        if let Some(failed) = self.tables.iter().find(|t| t.state() == AppenderState::Failed) {
            return Err(TableError::invalid_state(format!(
                "{} failed during a flush and must be recovered",
                failed.name
            )));
        }
        Ok(summaries)
    }

    /// Number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no table is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::reader::TableReader;
    use crate::writer::write_table;
    use lineidx_storage::{InMemoryBackend, StorageError, StorageResult};
    use std::fs;
    use tempfile::tempdir;

    fn row(id: i64, text: &str) -> Record {
        Record::new(vec![Field::Int(id), Field::text(text)])
    }

    fn rows(n: i64) -> Vec<Record> {
        (0..n).map(|i| row(i, &"v".repeat(i as usize % 7))).collect()
    }

    fn memory_appender() -> (TableAppender<InMemoryBackend>, InMemoryBackend, InMemoryBackend) {
        let data = InMemoryBackend::new();
        let index = InMemoryBackend::new();
        let appender =
            TableAppender::with_backends("mem", data.clone(), index.clone(), AppendConfig::default())
                .unwrap();
        (appender, data, index)
    }

    #[test]
    fn flush_tracks_offsets_across_batches() {
        let (mut appender, data, index) = memory_appender();

        appender.push(&row(1, "a")).unwrap();
        appender.push(&row(2, "bb")).unwrap();
        assert_eq!(appender.pending_len(), 2);
        assert!(data.data().is_empty());

        assert_eq!(appender.flush().unwrap(), 2);
        assert_eq!(appender.next_offset(), 9);

        appender.push(&row(3, "c")).unwrap();
        appender.flush().unwrap();

        assert_eq!(data.data(), b"1\ta\n2\tbb\n3\tc\n");
        assert_eq!(index.data(), b"0\n4\n9\n");
        assert_eq!(appender.rows_written(), 3);
    }

    #[test]
    fn empty_flush_is_noop() {
        let (mut appender, data, _) = memory_appender();
        assert_eq!(appender.flush().unwrap(), 0);
        assert!(data.data().is_empty());
    }

    #[test]
    fn batched_equals_bulk() {
        let dir = tempdir().unwrap();
        let bulk = TablePaths::new(dir.path().join("bulk.tsv"));
        let appended = TablePaths::new(dir.path().join("appended.tsv"));
        let records = rows(25);

        write_table(&bulk, records.clone()).unwrap();

        let mut appender = TableAppender::create(&appended, AppendConfig::default()).unwrap();
        for (i, record) in records.iter().enumerate() {
            appender.push(record).unwrap();
            if i % 4 == 3 {
                appender.flush().unwrap();
            }
        }
        appender.finish().unwrap();

        assert_eq!(fs::read(bulk.data()).unwrap(), fs::read(appended.data()).unwrap());
        assert_eq!(fs::read(bulk.index()).unwrap(), fs::read(appended.index()).unwrap());
    }

    #[test]
    fn push_after_finish_is_invalid_state() {
        let (mut appender, _, _) = memory_appender();
        appender.push(&row(1, "a")).unwrap();
        let summary = appender.finish().unwrap();
        assert_eq!(summary, WriteSummary { rows: 1, data_len: 4 });

        assert!(matches!(
            appender.push(&row(2, "b")),
            Err(TableError::InvalidState { .. })
        ));
        assert!(matches!(appender.flush(), Err(TableError::InvalidState { .. })));
        assert!(matches!(appender.finish(), Err(TableError::InvalidState { .. })));
    }

    #[test]
    fn invalid_record_rejected_at_push() {
        let (mut appender, _, _) = memory_appender();
        appender.push(&row(1, "a")).unwrap();
        assert!(matches!(
            appender.push(&row(2, "tab\there")),
            Err(TableError::InvalidInput { .. })
        ));
        assert!(matches!(
            appender.push(&Record::new(vec![Field::Int(3)])),
            Err(TableError::InvalidInput { .. })
        ));
        assert_eq!(appender.pending_len(), 1);
        assert_eq!(appender.state(), AppenderState::Open);
    }

    /// Accepts appends until a byte budget runs out.
    #[derive(Debug, Clone)]
    struct FullDisk {
        inner: InMemoryBackend,
        budget: u64,
    }

    impl StorageBackend for FullDisk {
        fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
            self.inner.read_at(offset, len)
        }
        fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
            if self.inner.size()? + data.len() as u64 > self.budget {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "no space left on device",
                )));
            }
            self.inner.append(data)
        }
        fn flush(&mut self) -> StorageResult<()> {
            Ok(())
        }
        fn size(&self) -> StorageResult<u64> {
            self.inner.size()
        }
        fn sync(&mut self) -> StorageResult<()> {
            Ok(())
        }
        fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
            self.inner.truncate(new_size)
        }
    }

    #[test]
    fn failed_flush_poisons_and_recovery_trims_tail() {
        let data = FullDisk {
            inner: InMemoryBackend::new(),
            budget: 1024,
        };
        let index = FullDisk {
            inner: InMemoryBackend::new(),
            budget: 2,
        };
        let data_probe = data.inner.clone();
        let index_probe = index.inner.clone();

        let mut appender =
            TableAppender::with_backends("disk", data, index, AppendConfig::default()).unwrap();
        appender.push(&row(1, "a")).unwrap();
        appender.flush().unwrap();
        appender.push(&row(2, "b")).unwrap();

        let err = appender.flush().unwrap_err();
        assert!(err.is_io());
        assert_eq!(appender.state(), AppenderState::Failed);
        assert!(matches!(appender.push(&row(3, "c")), Err(TableError::InvalidState { .. })));

        // Data has the second row, index does not.
        assert_eq!(data_probe.data(), b"1\ta\n2\tb\n");
        assert_eq!(index_probe.data(), b"0\n");

        let mut resumed = TableAppender::recover_backends(
            "disk",
            data_probe.clone(),
            index_probe.clone(),
            AppendConfig::default(),
        )
        .unwrap();
        assert_eq!(data_probe.data(), b"1\ta\n");
        assert_eq!(resumed.rows_written(), 1);
        assert_eq!(resumed.next_offset(), 4);

        resumed.push(&row(2, "b")).unwrap();
        resumed.finish().unwrap();
        assert_eq!(data_probe.data(), b"1\ta\n2\tb\n");
        assert_eq!(index_probe.data(), b"0\n4\n");
    }

    #[test]
    fn finish_all_reports_failed_table() {
        let disk = |budget| FullDisk {
            inner: InMemoryBackend::new(),
            budget,
        };
        let roomy_data = disk(1024);
        let written = roomy_data.inner.clone();

        let mut appender = Appender::default();
        let ok = appender.register(
            TableAppender::with_backends("ok", roomy_data, disk(1024), AppendConfig::default())
                .unwrap(),
        );
        let full = appender.register(
            TableAppender::with_backends("full", disk(0), disk(1024), AppendConfig::default())
                .unwrap(),
        );
        appender.push(ok, &row(1, "a")).unwrap();
        appender.push(full, &row(1, "a")).unwrap();
        assert!(appender.flush_all().unwrap_err().is_io());
        assert_eq!(appender.table(full).unwrap().state(), AppenderState::Failed);

        assert!(matches!(
            appender.finish_all(),
            Err(TableError::InvalidState { .. })
        ));
        assert_eq!(appender.table(ok).unwrap().state(), AppenderState::Finished);
        assert_eq!(written.data(), b"1\ta\n");
    }

    #[test]
    fn recovery_drops_torn_index_entry() {
        let data = InMemoryBackend::with_data(b"1\ta\n2\tb\n".to_vec());
        let index = InMemoryBackend::with_data(b"0\n4".to_vec());

        let resumed =
            TableAppender::recover_backends("torn", data.clone(), index.clone(), AppendConfig::default())
                .unwrap();
        assert_eq!(index.data(), b"0\n");
        assert_eq!(data.data(), b"1\ta\n");
        assert_eq!(resumed.rows_written(), 1);
    }

    #[test]
    fn recovery_keeps_arity() {
        let data = InMemoryBackend::with_data(b"1\ta\n".to_vec());
        let index = InMemoryBackend::with_data(b"0\n".to_vec());

        let mut resumed =
            TableAppender::recover_backends("arity", data, index, AppendConfig::default()).unwrap();
        assert_eq!(resumed.arity(), Some(2));
        assert!(matches!(
            resumed.push(&Record::new(vec![Field::Int(1)])),
            Err(TableError::InvalidInput { .. })
        ));
    }

    #[test]
    fn recovery_rejects_index_past_data() {
        let data = InMemoryBackend::with_data(b"1\ta\n".to_vec());
        let index = InMemoryBackend::with_data(b"0\n4\n".to_vec());

        let result = TableAppender::recover_backends("bad", data, index, AppendConfig::default());
        assert!(matches!(result, Err(TableError::Corrupted { .. })));
    }

    #[test]
    fn truncate_rows_cuts_both_files() {
        let (mut appender, data, index) = memory_appender();
        for (id, text) in [(1, "a"), (2, "bb"), (3, "c")] {
            appender.push(&row(id, text)).unwrap();
        }
        appender.flush().unwrap();

        appender.truncate_rows(1).unwrap();
        assert_eq!(data.data(), b"1\ta\n");
        assert_eq!(index.data(), b"0\n");
        assert_eq!(appender.rows_written(), 1);
        assert_eq!(appender.next_offset(), 4);

        appender.push(&row(4, "d")).unwrap();
        appender.finish().unwrap();
        assert_eq!(data.data(), b"1\ta\n4\td\n");
        assert_eq!(index.data(), b"0\n4\n");
    }

    #[test]
    fn truncate_rows_checks_cursor() {
        let (mut appender, _, _) = memory_appender();
        appender.push(&row(1, "a")).unwrap();
        assert!(matches!(
            appender.truncate_rows(0),
            Err(TableError::InvalidState { .. })
        ));
        appender.flush().unwrap();
        assert!(matches!(
            appender.truncate_rows(2),
            Err(TableError::InvalidInput { .. })
        ));
        appender.truncate_rows(1).unwrap();
        appender.truncate_rows(0).unwrap();
        assert_eq!(appender.arity(), None);
    }

    #[test]
    fn align_rows_trims_to_shortest_table() {
        let mut appender = Appender::default();
        let mut buffers = Vec::new();
        let mut ids = Vec::new();
        for (name, rows) in [("payload", 3), ("labels", 2), ("sizes", 2)] {
            let (mut table, data, index) = memory_appender();
            for id in 0..rows {
                table.push(&row(id, name)).unwrap();
            }
            table.flush().unwrap();
            buffers.push((data, index));
            ids.push(appender.register(table));
        }

        assert_eq!(appender.align_rows().unwrap(), 2);
        for id in &ids {
            assert_eq!(appender.table(*id).unwrap().rows_written(), 2);
        }
        let (payload_data, payload_index) = &buffers[0];
        assert_eq!(payload_data.data(), b"0\tpayload\n1\tpayload\n");
        assert_eq!(payload_index.data(), b"0\n10\n");
    }

    #[test]
    fn create_rejects_index_equal_to_data() {
        let dir = tempdir().unwrap();
        let paths = TablePaths::new(dir.path().join("t.lineidx"));
        assert!(matches!(
            TableAppender::create(&paths, AppendConfig::default()),
            Err(TableError::InvalidInput { .. })
        ));
        assert!(!paths.data().exists());
    }

    #[test]
    fn reopen_resumes_on_disk() {
        let dir = tempdir().unwrap();
        let paths = TablePaths::new(dir.path().join("out").join("t.tsv"));
        let records = rows(10);

        {
            let mut appender = TableAppender::create(&paths, AppendConfig::default()).unwrap();
            for record in &records[..6] {
                appender.push(record).unwrap();
            }
            appender.finish().unwrap();
        }

        let mut appender = TableAppender::reopen(&paths, AppendConfig::default()).unwrap();
        assert_eq!(appender.rows_written(), 6);
        for record in &records[6..] {
            appender.push(record).unwrap();
        }
        appender.finish().unwrap();

        let expected = TablePaths::new(dir.path().join("expected.tsv"));
        write_table(&expected, records).unwrap();
        assert_eq!(fs::read(paths.data()).unwrap(), fs::read(expected.data()).unwrap());
        assert_eq!(fs::read(paths.index()).unwrap(), fs::read(expected.index()).unwrap());
    }

    #[test]
    fn reopen_missing_table_starts_empty() {
        let dir = tempdir().unwrap();
        let paths = TablePaths::new(dir.path().join("fresh.tsv"));
        let appender = TableAppender::reopen(&paths, AppendConfig::default()).unwrap();
        assert_eq!(appender.rows_written(), 0);
        assert_eq!(appender.next_offset(), 0);
    }

    #[test]
    fn create_truncates_existing_table() {
        let dir = tempdir().unwrap();
        let paths = TablePaths::new(dir.path().join("t.tsv"));
        write_table(&paths, rows(3)).unwrap();

        let mut appender = TableAppender::create(&paths, AppendConfig::default()).unwrap();
        appender.push(&row(9, "z")).unwrap();
        appender.finish().unwrap();

        let reader = TableReader::open(paths.data()).unwrap();
        assert_eq!(reader.row_count(), 1);
        assert_eq!(reader.read_row(0).unwrap(), vec!["9", "z"]);
    }

    #[test]
    fn second_appender_on_same_table_is_locked() {
        let dir = tempdir().unwrap();
        let paths = TablePaths::new(dir.path().join("t.tsv"));

        let mut first = TableAppender::create(&paths, AppendConfig::default()).unwrap();
        assert!(matches!(
            TableAppender::reopen(&paths, AppendConfig::default()),
            Err(TableError::TableLocked { .. })
        ));

        first.finish().unwrap();
        assert!(TableAppender::reopen(&paths, AppendConfig::default()).is_ok());
    }

    #[test]
    fn registry_routes_by_id() {
        let dir = tempdir().unwrap();
        let mut appender = Appender::new();
        let a = appender
            .create_table(&TablePaths::new(dir.path().join("a.tsv")), AppendConfig::default())
            .unwrap();
        let b = appender
            .create_table(&TablePaths::new(dir.path().join("b.tsv")), AppendConfig::default())
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(appender.len(), 2);

        appender.push(a, &row(1, "a")).unwrap();
        appender.push(b, &row(2, "b")).unwrap();
        appender.push(b, &row(3, "c")).unwrap();
        appender.flush_all().unwrap();
        assert_eq!(appender.table(b).unwrap().rows_written(), 2);

        appender.finish(a).unwrap();
        assert!(matches!(
            appender.push(a, &row(4, "d")),
            Err(TableError::InvalidState { .. })
        ));

        let summaries = appender.finish_all().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].rows, 2);
    }

    #[test]
    fn unknown_id_rejected() {
        let mut appender: Appender<InMemoryBackend> = Appender::default();
        assert!(matches!(
            appender.push(TableId(3), &row(1, "a")),
            Err(TableError::InvalidInput { .. })
        ));
    }
}
