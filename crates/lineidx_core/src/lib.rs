//! # lineidx Core
//!
//! Line-indexed TSV row tables.
//!
//! A table is a pair of files: the data file holds one tab-separated
//! record per line, the index file holds the byte offset at which each
//! line starts. Row `i` is read with one positioned read, without scanning
//! rows `0..i`.
//!
//! This crate provides:
//! - [`write_table`] - one-shot bulk writes published by rename
//! - [`TableReader`] - random access and streaming reads
//! - [`TableAppender`] / [`Appender`] - batched appends with bounded memory
//!   and recovery after an interrupted flush
//! - [`build_linelist`] - selection lists derived from JSON label fields
//! - [`verify_table`] - offset and framing checks
//!
//! Field values never contain tabs or newlines; binary payloads go in as
//! base64 via [`Field::from_bytes`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod appender;
mod config;
mod error;
mod field;
mod index;
mod linelist;
mod lock;
mod paths;
mod reader;
mod verify;
mod writer;

pub use appender::{Appender, AppenderState, TableAppender, TableId};
pub use config::{AppendConfig, SelectionConfig};
pub use error::{TableError, TableResult};
pub use field::{Field, Record, FIELD_SEPARATOR, LINE_TERMINATOR};
pub use index::{push_entry, LineIndex};
pub use linelist::{
    build_linelist, decode_labels, is_selected, is_truthy, selected_rows, LinelistSummary,
};
pub use paths::{TablePaths, INDEX_EXTENSION, LINELIST_SUFFIX, TEMP_SUFFIX};
pub use reader::{split_fields, Rows, TableReader};
pub use verify::{verify_table, VerifyReport};
pub use writer::{try_write_table, write_table, WriteSummary};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
