//! Error types for reference database operations.

use std::path::PathBuf;

use arbor_odb::OdbError;
use arbor_types::Oid;
use thiserror::Error;

/// Errors that can occur during reference database operations.
#[derive(Debug, Error)]
pub enum RefdbError {
    /// The reference exists in neither the loose nor the packed store.
    #[error("reference not found: {name}")]
    NotFound { name: String },

    /// A non-forced write hit an existing reference with the same name.
    #[error("reference already exists: {name}")]
    AlreadyExists { name: String },

    /// The name nests under, or shadows, an existing reference path.
    #[error("path to reference {name} collides with existing reference {existing}")]
    Collision { name: String, existing: String },

    /// The packed references file is malformed.
    #[error("packed references file is corrupted: {reason}")]
    CorruptPacked { reason: String },

    /// A loose reference file is malformed.
    #[error("corrupted loose reference file: {}", path.display())]
    CorruptLoose { path: PathBuf },

    /// The reference name violates the naming rules.
    #[error("invalid reference name {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The iterator filter is not a valid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(#[from] glob::PatternError),

    /// I/O failure in the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Peeling could not resolve an object.
    #[error("object lookup failed for {oid}")]
    ObjectLookup {
        oid: Oid,
        #[source]
        source: OdbError,
    },

    /// Loose files absorbed by a packed-file commit could not all be removed.
    #[error("failed to remove {} loose reference(s) after packing", failed.len())]
    LoosePrune { failed: Vec<String> },
}

/// Result alias for reference database operations.
pub type RefdbResult<T> = Result<T, RefdbError>;
