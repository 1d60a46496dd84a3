//! Merged iteration over the loose and packed stores.
//!
//! Construction captures a consistent snapshot: the loose name list, an
//! owned copy of the packed entries, and the shadow set (names present in
//! both stores, where the loose value wins). The backend's cache is not
//! touched again for the lifetime of the walk, so cache refreshes between
//! other operations cannot shift an iterator under way.

use std::collections::HashSet;

use glob::Pattern;
use tracing::debug;

use crate::backend::FsRefdb;
use crate::cache::RefCache;
use crate::error::RefdbResult;
use crate::loose;
use crate::packed::PackedEntry;
use crate::types::{RefTarget, Reference};

/// Iterator over every reference visible in the union of both stores.
///
/// Loose references come first, then unshadowed packed entries in name
/// order. Each name is yielded at most once. Exhaustion is `None`.
pub struct RefIterator<'a> {
    backend: &'a FsRefdb,
    glob: Option<Pattern>,
    loose: Vec<String>,
    loose_pos: usize,
    packed: Vec<PackedEntry>,
    packed_pos: usize,
    shadowed: HashSet<String>,
}

impl<'a> std::fmt::Debug for RefIterator<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefIterator").finish_non_exhaustive()
    }
}

impl<'a> RefIterator<'a> {
    pub(crate) fn new(
        backend: &'a FsRefdb,
        cache: &RefCache,
        glob: Option<&str>,
    ) -> RefdbResult<Self> {
        let glob = glob.map(Pattern::new).transpose()?;

        let mut loose = Vec::new();
        let mut shadowed = HashSet::new();
        for name in backend.loose_names()? {
            if name.ends_with(".lock") {
                continue;
            }
            if let Some(pattern) = &glob {
                if !pattern.matches(&name) {
                    continue;
                }
            }
            if cache.contains(&name) {
                shadowed.insert(name.clone());
            }
            loose.push(name);
        }

        let packed: Vec<PackedEntry> = cache.entries().cloned().collect();
        debug!(
            loose = loose.len(),
            packed = packed.len(),
            shadowed = shadowed.len(),
            "snapshotted reference iterator"
        );

        Ok(Self {
            backend,
            glob,
            loose,
            loose_pos: 0,
            packed,
            packed_pos: 0,
            shadowed,
        })
    }

    fn glob_matches(&self, name: &str) -> bool {
        self.glob.as_ref().map_or(true, |p| p.matches(name))
    }

    /// The next reference, reading loose values from disk at yield time.
    ///
    /// A loose file that vanished or turned unreadable since the snapshot
    /// is skipped, not an error.
    pub fn next_ref(&mut self) -> Option<Reference> {
        while self.loose_pos < self.loose.len() {
            let name = self.loose[self.loose_pos].clone();
            self.loose_pos += 1;

            match loose::read(self.backend.root(), &name) {
                Ok(Some(target)) => return Some(Reference { name, target }),
                Ok(None) | Err(_) => continue,
            }
        }

        while self.packed_pos < self.packed.len() {
            let entry = &self.packed[self.packed_pos];
            self.packed_pos += 1;

            if self.shadowed.contains(&entry.name) || !self.glob_matches(&entry.name) {
                continue;
            }
            return Some(Reference {
                name: entry.name.clone(),
                target: RefTarget::Direct {
                    oid: entry.oid,
                    peel: entry.peel,
                },
            });
        }

        None
    }

    /// The next reference name, without touching the loose files.
    pub fn next_name(&mut self) -> Option<String> {
        if self.loose_pos < self.loose.len() {
            let name = self.loose[self.loose_pos].clone();
            self.loose_pos += 1;
            return Some(name);
        }

        while self.packed_pos < self.packed.len() {
            let entry = &self.packed[self.packed_pos];
            self.packed_pos += 1;

            if self.shadowed.contains(&entry.name) || !self.glob_matches(&entry.name) {
                continue;
            }
            return Some(entry.name.clone());
        }

        None
    }
}

impl Iterator for RefIterator<'_> {
    type Item = Reference;

    fn next(&mut self) -> Option<Reference> {
        self.next_ref()
    }
}
