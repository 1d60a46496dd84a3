use arbor_types::Oid;
use serde::{Deserialize, Serialize};

/// The kind of object an [`Oid`] names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A commit: a snapshot plus its ancestry.
    Commit,
    /// A tree: a directory listing.
    Tree,
    /// A blob: raw file content.
    Blob,
    /// An annotated tag pointing at another object.
    Tag,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Tree => write!(f, "tree"),
            Self::Blob => write!(f, "blob"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

/// What the reference database learns about an object from one lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// The type of the object.
    pub kind: ObjectKind,
    /// For tag objects: the object the tag points at.
    pub tag_target: Option<Oid>,
}

impl ObjectInfo {
    /// Describe a non-tag object.
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            tag_target: None,
        }
    }

    /// Describe a tag object pointing at `target`.
    pub fn tag(target: Oid) -> Self {
        Self {
            kind: ObjectKind::Tag,
            tag_target: Some(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_info_carries_target() {
        let target = Oid::from_raw([3u8; 20]);
        let info = ObjectInfo::tag(target);
        assert_eq!(info.kind, ObjectKind::Tag);
        assert_eq!(info.tag_target, Some(target));
    }

    #[test]
    fn non_tag_info_has_no_target() {
        let info = ObjectInfo::new(ObjectKind::Commit);
        assert_eq!(info.tag_target, None);
    }

    #[test]
    fn kind_display() {
        assert_eq!(ObjectKind::Tag.to_string(), "tag");
        assert_eq!(ObjectKind::Commit.to_string(), "commit");
    }
}
