//! Test fixtures and table helpers.
//!
//! Provides temporary tables with the usual file layout and helpers for
//! reading them back.

use lineidx_core::{
    write_table, AppendConfig, Field, Record, TableAppender, TablePaths, TableReader,
};
use std::fs;
use tempfile::TempDir;

/// A table in a temporary directory, removed on drop.
pub struct TempTable {
    paths: TablePaths,
    _temp_dir: TempDir,
}

impl TempTable {
    /// Creates paths for a table named `file_name` in a fresh directory.
    ///
    /// No file is created until something is written.
    pub fn new(file_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let paths = TablePaths::new(temp_dir.path().join(file_name));
        Self {
            paths,
            _temp_dir: temp_dir,
        }
    }

    /// Table file paths.
    pub fn paths(&self) -> &TablePaths {
        &self.paths
    }

    /// Bulk-writes `records`, replacing any previous content.
    pub fn write(&self, records: impl IntoIterator<Item = Record>) {
        write_table(&self.paths, records).expect("Failed to write table");
    }

    /// Writes `records` through an appender, flushing after each batch.
    pub fn append_batches(&self, batches: &[Vec<Record>]) {
        let mut appender = TableAppender::create(&self.paths, AppendConfig::default())
            .expect("Failed to create appender");
        for batch in batches {
            for record in batch {
                appender.push(record).expect("Failed to push record");
            }
            appender.flush().expect("Failed to flush");
        }
        appender.finish().expect("Failed to finish appender");
    }

    /// Opens a reader over the table.
    pub fn reader(&self) -> TableReader {
        TableReader::open_paths(&self.paths).expect("Failed to open table")
    }

    /// Reads every row through the streaming iterator.
    pub fn read_all(&self) -> Vec<Vec<String>> {
        self.reader()
            .rows()
            .map(|row| row.expect("Failed to read row").1)
            .collect()
    }

    /// Raw data file content.
    pub fn data_bytes(&self) -> Vec<u8> {
        fs::read(self.paths.data()).expect("Failed to read data file")
    }

    /// Raw index file content.
    pub fn index_bytes(&self) -> Vec<u8> {
        fs::read(self.paths.index()).expect("Failed to read index file")
    }
}

/// Writes a label table `[row id, labels]` with the given label JSON.
pub fn label_table(labels: &[&str]) -> TempTable {
    let table = TempTable::new("train.label.tsv");
    table.write(
        labels
            .iter()
            .zip(0i64..)
            .map(|(json, id)| Record::new(vec![Field::Int(id), Field::text(*json)])),
    );
    table
}

/// The fields a record reads back as.
pub fn rendered(record: &Record) -> Vec<String> {
    record.fields().iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_table_round_trip() {
        let table = TempTable::new("t.tsv");
        table.write(vec![Record::new(vec![Field::Int(7), Field::text("x")])]);
        assert_eq!(table.read_all(), vec![vec!["7", "x"]]);
        assert_eq!(table.data_bytes(), b"7\tx\n");
        assert_eq!(table.index_bytes(), b"0\n");
    }

    #[test]
    fn label_table_ids_are_row_numbers() {
        let table = label_table(&["[]", "null"]);
        assert_eq!(table.read_all(), vec![vec!["0", "[]"], vec!["1", "null"]]);
    }
}
