//! # lineidx Storage
//!
//! Byte-store backends underneath lineidx row tables.
//!
//! A row table is two files (data and index) and both are grown by
//! appending and read by offset. This crate provides that primitive and
//! nothing more: backends never interpret the bytes they hold. Line
//! framing, offsets and records all live in `lineidx_core`.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - OS files, optionally opened read-only
//! - [`InMemoryBackend`] - shared in-memory buffer for tests
//!
//! ## Example
//!
//! ```rust
//! use lineidx_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.append(b"a\tb\nc\td\n").unwrap();
//! let line = backend.read_until(4, b'\n').unwrap();
//! assert_eq!(&line, b"c\td\n");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{StorageBackend, SCAN_CHUNK_SIZE};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
