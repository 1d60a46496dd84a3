//! Object database interface for the Arbor version control system.
//!
//! The reference database only ever asks the object database one question:
//! what kind of object does an [`Oid`](arbor_types::Oid) name, and if it is
//! a tag, which object does the tag point at. This crate defines that seam.
//!
//! # Modules
//!
//! - [`error`] — Error types for object lookups
//! - [`object`] — [`ObjectKind`] and [`ObjectInfo`]
//! - [`traits`] — The [`ObjectDatabase`] trait
//! - [`memory`] — In-memory [`InMemoryOdb`] for tests

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{OdbError, OdbResult};
pub use memory::InMemoryOdb;
pub use object::{ObjectInfo, ObjectKind};
pub use traits::ObjectDatabase;
