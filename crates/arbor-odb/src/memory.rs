//! In-memory object database for testing and ephemeral use.

use std::collections::HashMap;
use std::sync::RwLock;

use arbor_types::Oid;

use crate::error::{OdbError, OdbResult};
use crate::object::{ObjectInfo, ObjectKind};
use crate::traits::ObjectDatabase;

/// An in-memory implementation of [`ObjectDatabase`].
///
/// All data lives in a `HashMap` behind a `RwLock`. Intended for tests and
/// embedding; data is lost when the database is dropped.
#[derive(Debug, Default)]
pub struct InMemoryOdb {
    objects: RwLock<HashMap<Oid, ObjectInfo>>,
}

impl InMemoryOdb {
    /// Create a new empty object database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object with an explicit description.
    pub fn insert(&self, oid: Oid, info: ObjectInfo) {
        self.objects.write().expect("lock poisoned").insert(oid, info);
    }

    /// Register a commit object.
    pub fn insert_commit(&self, oid: Oid) {
        self.insert(oid, ObjectInfo::new(ObjectKind::Commit));
    }

    /// Register a blob object.
    pub fn insert_blob(&self, oid: Oid) {
        self.insert(oid, ObjectInfo::new(ObjectKind::Blob));
    }

    /// Register an annotated tag pointing at `target`.
    pub fn insert_tag(&self, oid: Oid, target: Oid) {
        self.insert(oid, ObjectInfo::tag(target));
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no objects are registered.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }
}

impl ObjectDatabase for InMemoryOdb {
    fn lookup(&self, oid: &Oid) -> OdbResult<ObjectInfo> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(oid).copied().ok_or(OdbError::NotFound(*oid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(byte: u8) -> Oid {
        Oid::from_raw([byte; 20])
    }

    #[test]
    fn lookup_missing_is_not_found() {
        let odb = InMemoryOdb::new();
        let err = odb.lookup(&oid(1)).unwrap_err();
        assert!(matches!(err, OdbError::NotFound(_)));
    }

    #[test]
    fn lookup_commit() {
        let odb = InMemoryOdb::new();
        odb.insert_commit(oid(1));
        let info = odb.lookup(&oid(1)).unwrap();
        assert_eq!(info.kind, ObjectKind::Commit);
        assert_eq!(info.tag_target, None);
    }

    #[test]
    fn lookup_tag_reports_target() {
        let odb = InMemoryOdb::new();
        odb.insert_commit(oid(1));
        odb.insert_tag(oid(2), oid(1));
        let info = odb.lookup(&oid(2)).unwrap();
        assert_eq!(info.kind, ObjectKind::Tag);
        assert_eq!(info.tag_target, Some(oid(1)));
    }
}
