//! CLI command implementations.

pub mod convert;
pub mod inspect;
pub mod linelist;
pub mod recover;
pub mod verify;
