//! Filesystem-backed reference database for the Arbor version control system.
//!
//! References are named pointers from human-meaningful strings
//! (`refs/heads/main`, `HEAD`) to objects in the object database, or
//! symbolically to other references. This crate persists them across two
//! coexisting on-disk representations and presents a uniform view over
//! both:
//!
//! - **Loose**: one file per reference, path equal to the name.
//! - **Packed**: a single `packed-refs` text file aggregating many
//!   references, refreshed into an in-memory cache keyed by the file's
//!   modification time.
//!
//! A name present in both stores resolves to the loose value. Compaction
//! ([`FsRefdb::compress`]) folds every loose reference into the packed
//! file — peeling tag references through the object database on the way —
//! and then deletes the absorbed loose files. The packed file is committed
//! before any loose file is unlinked, so a crash between the two steps
//! never loses a reference.
//!
//! # Modules
//!
//! - [`error`] — [`RefdbError`] and the [`RefdbResult`] alias
//! - [`types`] — [`Reference`] and the [`RefTarget`] sum type
//! - [`names`] — Reference-name validation
//! - [`packed`] — The packed references file codec
//! - [`backend`] — [`FsRefdb`], the backend operations
//! - [`iter`] — [`RefIterator`], merged shadow-aware enumeration

pub mod backend;
pub mod error;
pub mod iter;
pub mod names;
pub mod packed;
pub mod types;

mod cache;
mod lockfile;
mod loose;

pub use backend::{FsRefdb, RefdbOptions, PACKED_REFS_FILE, REFS_DIR};
pub use error::{RefdbError, RefdbResult};
pub use iter::RefIterator;
pub use packed::{PackedEntry, PackedFlags, PeelingMode, PACKED_REFS_HEADER};
pub use types::{RefTarget, Reference};
