use arbor_types::Oid;
use thiserror::Error;

/// Errors from object database lookups.
#[derive(Debug, Error)]
pub enum OdbError {
    /// The requested object does not exist.
    #[error("object not found: {0}")]
    NotFound(Oid),

    /// A tag object carries no target, so it cannot be followed.
    #[error("tag object {0} has no target")]
    MissingTagTarget(Oid),

    /// A tag chain exceeded the follow limit (most likely a cycle).
    #[error("tag chain starting at {0} is too deep")]
    TagChainTooDeep(Oid),

    /// Failure inside a concrete backend.
    #[error("object database backend error: {0}")]
    Backend(String),
}

/// Result alias for object database operations.
pub type OdbResult<T> = Result<T, OdbError>;
