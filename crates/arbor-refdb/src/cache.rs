//! The in-memory packed reference cache.
//!
//! The cache mirrors the packed file as a name-keyed map and is refreshed
//! by comparing the file's modification time against the last one seen. It
//! is never written back as such; mutations rewrite the packed file and
//! then re-stamp the cache.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use tracing::debug;

use crate::error::RefdbResult;
use crate::packed::{self, PackedEntry};

/// Name-keyed snapshot of the packed file.
///
/// `BTreeMap` keeps the entries name-sorted, which the emitter and the
/// iterator both rely on.
#[derive(Debug, Default)]
pub(crate) struct RefCache {
    entries: BTreeMap<String, PackedEntry>,
    mtime: Option<SystemTime>,
}

impl RefCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the cache up to date with the packed file at `path`.
    ///
    /// - File absent: the cache empties and the call succeeds.
    /// - Modification time unchanged: the cache is current, nothing to do.
    /// - Otherwise: reparse. A parse failure leaves the cache empty and
    ///   surfaces `CorruptPacked`; the next refresh parses from scratch.
    pub fn refresh(&mut self, path: &Path) -> RefdbResult<()> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.entries.clear();
                self.mtime = None;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mtime = metadata.modified()?;
        if self.mtime == Some(mtime) {
            return Ok(());
        }

        let data = fs::read(path)?;
        self.entries.clear();
        self.mtime = None;

        // The parser has already applied the declared peeling mode to the
        // entry flags; the mode itself is not retained.
        let (entries, _mode) = packed::parse(&data)?;
        for entry in entries {
            // Duplicate names in the file: the last one wins.
            self.entries.insert(entry.name.clone(), entry);
        }
        self.mtime = Some(mtime);

        debug!(entries = self.entries.len(), "reloaded packed references");
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&PackedEntry> {
        self.entries.get(name)
    }

    /// Insert an entry, replacing and returning any same-named one.
    pub fn insert(&mut self, entry: PackedEntry) -> Option<PackedEntry> {
        self.entries.insert(entry.name.clone(), entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<PackedEntry> {
        self.entries.remove(name)
    }

    /// Entry names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &PackedEntry> {
        self.entries.values()
    }

    /// Mutable entries in name order.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut PackedEntry> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Stamp the cache with the just-written packed file's mtime so the
    /// next refresh does not reparse our own output.
    pub fn record_mtime(&mut self, mtime: Option<SystemTime>) {
        self.mtime = mtime;
    }
}
