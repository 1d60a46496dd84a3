//! Core reference types.
//!
//! A reference is a named pointer: either directly to an object in the
//! object database, or symbolically to another reference name.

use arbor_types::Oid;
use serde::{Deserialize, Serialize};

/// The value a reference points at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefTarget {
    /// A direct pointer to an object.
    Direct {
        /// The referenced object.
        oid: Oid,
        /// For tag references resolved from the packed store: the non-tag
        /// object at the end of the tag chain, when known.
        peel: Option<Oid>,
    },

    /// A symbolic pointer naming another reference.
    ///
    /// The target is not required to exist; following it is best-effort
    /// and happens in layers above this one.
    Symbolic {
        /// The name of the referenced reference.
        target: String,
    },
}

impl RefTarget {
    /// A direct target without peel information.
    pub fn direct(oid: Oid) -> Self {
        Self::Direct { oid, peel: None }
    }

    /// A symbolic target.
    pub fn symbolic(target: impl Into<String>) -> Self {
        Self::Symbolic {
            target: target.into(),
        }
    }

    /// Returns `true` if this is a direct target.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct { .. })
    }

    /// Returns `true` if this is a symbolic target.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic { .. })
    }

    /// The referenced object, if direct.
    pub fn oid(&self) -> Option<Oid> {
        match self {
            Self::Direct { oid, .. } => Some(*oid),
            Self::Symbolic { .. } => None,
        }
    }

    /// The cached peel, if direct and known.
    pub fn peel(&self) -> Option<Oid> {
        match self {
            Self::Direct { peel, .. } => *peel,
            Self::Symbolic { .. } => None,
        }
    }

    /// The referenced name, if symbolic.
    pub fn symbolic_target(&self) -> Option<&str> {
        match self {
            Self::Direct { .. } => None,
            Self::Symbolic { target } => Some(target),
        }
    }
}

/// A named reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Slash-separated reference name, e.g. `refs/heads/main`.
    pub name: String,
    /// What the reference points at.
    pub target: RefTarget,
}

impl Reference {
    /// Create a direct reference.
    pub fn direct(name: impl Into<String>, oid: Oid) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::direct(oid),
        }
    }

    /// Create a symbolic reference.
    pub fn symbolic(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::symbolic(target),
        }
    }
}
