use arbor_types::Oid;

use crate::error::OdbResult;
use crate::object::ObjectInfo;

/// Read-only view of the object database.
///
/// All implementations must satisfy these invariants:
/// - Lookups are pure: the same `Oid` always classifies the same way.
/// - A tag object always reports `tag_target: Some(..)`; every other kind
///   reports `tag_target: None`.
/// - A missing object is an error (`OdbError::NotFound`), never a silent
///   default.
pub trait ObjectDatabase: Send + Sync {
    /// Classify the object named by `oid`.
    fn lookup(&self, oid: &Oid) -> OdbResult<ObjectInfo>;
}
