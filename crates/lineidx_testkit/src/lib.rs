//! # lineidx Testkit
//!
//! Test utilities for lineidx.
//!
//! This crate provides:
//! - Temporary tables that clean up after themselves
//! - Property-based test generators using proptest
//! - Byte-exact format vectors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lineidx_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_table() {
//!     let table = TempTable::new("labels.tsv");
//!     table.write(vec![Record::new(vec![Field::Int(1), Field::text("[]")])]);
//!     assert_eq!(table.read_all(), vec![vec!["1", "[]"]]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
    pub use lineidx_core::{Field, Record, TablePaths};
}

pub use fixtures::*;
pub use generators::*;
pub use vectors::*;
