//! The filesystem reference backend.
//!
//! [`FsRefdb`] presents a uniform view over two coexisting stores below one
//! root directory: loose files (one reference per file, path equal to the
//! name) and the aggregate `packed-refs` file. Loose values shadow packed
//! ones; compaction folds loose references into the packed file and removes
//! the originals.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use arbor_odb::{ObjectDatabase, ObjectKind, OdbError};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::cache::RefCache;
use crate::error::{RefdbError, RefdbResult};
use crate::iter::RefIterator;
use crate::lockfile::Lockfile;
use crate::loose;
use crate::names::validate_ref_name;
use crate::packed::{self, PackedEntry};
use crate::types::{RefTarget, Reference};

/// File name of the packed references file below the backend root.
pub const PACKED_REFS_FILE: &str = "packed-refs";

/// Directory below the root holding the reference hierarchy.
pub const REFS_DIR: &str = "refs";

/// Follow limit for tag chains during peeling.
const MAX_PEEL_DEPTH: usize = 16;

/// Construction options for [`FsRefdb`].
#[derive(Clone, Debug, Default)]
pub struct RefdbOptions {
    /// Optional namespace. A namespace `a/b` roots the backend at
    /// `<repo>/refs/namespaces/a/refs/namespaces/b` instead of `<repo>`.
    pub namespace: Option<String>,
}

/// Filesystem-backed reference database.
///
/// Not safe for concurrent mutation from multiple backend instances on the
/// same repository beyond what atomic rename provides; within one instance
/// the cache is guarded by a single-writer mutex.
pub struct FsRefdb {
    root: PathBuf,
    odb: Arc<dyn ObjectDatabase>,
    cache: Mutex<RefCache>,
}

impl FsRefdb {
    /// Open the reference database rooted at `repo`.
    ///
    /// Ensures the `refs` directory exists below the (possibly namespaced)
    /// root.
    pub fn open(
        repo: impl Into<PathBuf>,
        odb: Arc<dyn ObjectDatabase>,
        options: RefdbOptions,
    ) -> RefdbResult<Self> {
        let repo = repo.into();
        let root = match options.namespace.as_deref() {
            Some(namespace) => namespace_root(&repo, namespace),
            None => repo,
        };
        fs::create_dir_all(root.join(REFS_DIR))?;

        debug!(root = %root.display(), "opened reference database");
        Ok(Self {
            root,
            odb,
            cache: Mutex::new(RefCache::new()),
        })
    }

    /// The directory all reference paths are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn packed_path(&self) -> PathBuf {
        self.root.join(PACKED_REFS_FILE)
    }

    fn cache(&self) -> MutexGuard<'_, RefCache> {
        self.cache.lock().expect("ref cache mutex poisoned")
    }

    /// Returns `true` if `name` exists in either store.
    pub fn exists(&self, name: &str) -> RefdbResult<bool> {
        let mut cache = self.cache();
        cache.refresh(&self.packed_path())?;

        if loose::ref_path(&self.root, name).is_file() {
            return Ok(true);
        }
        Ok(cache.contains(name))
    }

    /// Resolve `name` to a reference. The loose store wins over the packed
    /// one; a packed hit carries its peel when known.
    pub fn lookup(&self, name: &str) -> RefdbResult<Reference> {
        if let Some(target) = loose::read(&self.root, name)? {
            return Ok(Reference {
                name: name.to_string(),
                target,
            });
        }

        let mut cache = self.cache();
        cache.refresh(&self.packed_path())?;
        match cache.get(name) {
            Some(entry) => Ok(Reference {
                name: name.to_string(),
                target: RefTarget::Direct {
                    oid: entry.oid,
                    peel: entry.peel,
                },
            }),
            None => Err(RefdbError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Create or update `reference` as a loose file.
    ///
    /// Without `force`, an existing reference of the same name fails with
    /// `AlreadyExists`. In both cases the name must not nest under or over
    /// an existing packed name. A stale packed entry of the same name is
    /// left in place; the new loose file shadows it until the next
    /// compaction rewrites the packed store.
    pub fn write(&self, reference: &Reference, force: bool) -> RefdbResult<()> {
        validate_ref_name(&reference.name)?;
        if let RefTarget::Symbolic { target } = &reference.target {
            validate_ref_name(target)?;
        }
        self.ensure_path_available(&reference.name, None, force)?;
        loose::write(&self.root, reference)
    }

    /// Remove `name` from both stores.
    ///
    /// The loose file is unlinked first, then the packed store is rewritten
    /// without the entry. A failure between the two steps can leave the
    /// packed entry visible with the loose file already gone. `NotFound`
    /// only when neither store had the name.
    pub fn delete(&self, name: &str) -> RefdbResult<()> {
        let loose_path = loose::ref_path(&self.root, name);
        let mut loose_deleted = false;
        if loose_path.is_file() {
            fs::remove_file(&loose_path)?;
            loose_deleted = true;
        }

        let mut cache = self.cache();
        cache.refresh(&self.packed_path())?;
        if cache.remove(name).is_some() {
            self.commit_packed(&mut cache)?;
        } else if !loose_deleted {
            return Err(RefdbError::NotFound {
                name: name.to_string(),
            });
        }

        debug!(name, "deleted reference");
        Ok(())
    }

    /// Rename `old` to `new`, carrying the value over.
    ///
    /// `new` must be available, treating `old` itself as removable. The
    /// pair of steps (delete `old`, write `new`) is not atomic; a failure
    /// after the delete surfaces to the caller with `old` already gone.
    pub fn rename(&self, old: &str, new: &str, force: bool) -> RefdbResult<Reference> {
        validate_ref_name(new)?;
        self.ensure_path_available(new, Some(old), force)?;

        let previous = self.lookup(old)?;
        self.delete(old)?;

        let renamed = Reference {
            name: new.to_string(),
            target: previous.target,
        };
        loose::write(&self.root, &renamed)?;

        debug!(old, new, "renamed reference");
        Ok(renamed)
    }

    /// Fold every loose reference into the packed file and delete the loose
    /// originals.
    ///
    /// The packed file is fully committed before any loose file is
    /// unlinked, so a crash between the two steps leaves every absorbed
    /// name readable with its correct value (the duplicate is shadowed and
    /// equal). Unlink failures are collected and reported after the loop as
    /// a single `LoosePrune` error; the packed file is never rolled back.
    pub fn compress(&self) -> RefdbResult<()> {
        let mut cache = self.cache();
        cache.refresh(&self.packed_path())?;

        for name in self.loose_names()? {
            let entry = loose::read_packed(&self.root, &name)?;
            // Overwrites any packed entry of the same name with the loose
            // value, which is the authoritative one.
            cache.insert(entry);
        }

        self.commit_packed(&mut cache)
    }

    /// Iterate the union of both stores, optionally filtered by `glob`.
    pub fn iter(&self, glob: Option<&str>) -> RefdbResult<RefIterator<'_>> {
        let mut cache = self.cache();
        cache.refresh(&self.packed_path())?;
        RefIterator::new(self, &cache, glob)
    }

    /// Names of all loose references under `refs/`, sorted, including stale
    /// `.lock` leftovers (callers filter).
    pub(crate) fn loose_names(&self) -> RefdbResult<Vec<String>> {
        let refs_root = self.root.join(REFS_DIR);
        let mut names = Vec::new();
        if !refs_root.is_dir() {
            return Ok(names);
        }

        for entry in WalkDir::new(&refs_root) {
            let entry = entry.map_err(|e| RefdbError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    /// Resolve peels, emit the cache into `packed-refs`, prune absorbed
    /// loose files, and re-stamp the cache mtime.
    fn commit_packed(&self, cache: &mut RefCache) -> RefdbResult<()> {
        for entry in cache.entries_mut() {
            self.resolve_peel(entry)?;
        }

        let data = packed::emit(cache.entries());
        let packed_path = self.packed_path();
        let mut lock = Lockfile::acquire(&packed_path)?;
        lock.write_all(&data)?;
        lock.commit()?;
        debug!(entries = cache.len(), "committed packed references file");

        // Only now, with the packed file durable, remove the loose files it
        // absorbed. Keep going past individual failures and report them
        // together; the packed file is a superset of the loose state either
        // way.
        let mut failed = Vec::new();
        for entry in cache.entries_mut() {
            if !entry.flags.was_loose {
                continue;
            }
            let path = loose::ref_path(&self.root, &entry.name);
            if path.exists() {
                match fs::remove_file(&path) {
                    Ok(()) => entry.flags.was_loose = false,
                    Err(e) => {
                        warn!(name = %entry.name, error = %e, "failed to prune loose reference");
                        failed.push(entry.name.clone());
                    }
                }
            } else {
                entry.flags.was_loose = false;
            }
        }

        cache.record_mtime(fs::metadata(&packed_path).ok().and_then(|m| m.modified().ok()));

        if !failed.is_empty() {
            return Err(RefdbError::LoosePrune { failed });
        }
        Ok(())
    }

    /// Idempotent peel resolution for one packed entry.
    ///
    /// Tag objects get the non-tag object at the end of their target chain;
    /// everything else is marked unpeelable, so the emitted file can always
    /// claim `fully-peeled`.
    fn resolve_peel(&self, entry: &mut PackedEntry) -> RefdbResult<()> {
        if entry.flags.has_peel || entry.flags.cannot_peel {
            return Ok(());
        }

        let lookup = |oid| {
            self.odb
                .lookup(&oid)
                .map_err(|source| RefdbError::ObjectLookup { oid, source })
        };

        let info = lookup(entry.oid)?;
        if info.kind != ObjectKind::Tag {
            entry.flags.cannot_peel = true;
            return Ok(());
        }

        let mut target = info.tag_target.ok_or(RefdbError::ObjectLookup {
            oid: entry.oid,
            source: OdbError::MissingTagTarget(entry.oid),
        })?;
        let mut depth = 0;
        loop {
            let next = lookup(target)?;
            if next.kind != ObjectKind::Tag {
                break;
            }
            depth += 1;
            if depth > MAX_PEEL_DEPTH {
                return Err(RefdbError::ObjectLookup {
                    oid: entry.oid,
                    source: OdbError::TagChainTooDeep(entry.oid),
                });
            }
            target = next.tag_target.ok_or(RefdbError::ObjectLookup {
                oid: target,
                source: OdbError::MissingTagTarget(target),
            })?;
        }

        entry.peel = Some(target);
        entry.flags.has_peel = true;
        Ok(())
    }

    /// The path-collision check run before a write or rename.
    ///
    /// Without `force`, `new` must not already exist. Independently, `new`
    /// must not nest under or over any packed name other than `old`. Loose
    /// names are not consulted here; a loose collision surfaces from the
    /// filesystem when the write needs `new` to be both a file and a
    /// directory.
    fn ensure_path_available(
        &self,
        new: &str,
        old: Option<&str>,
        force: bool,
    ) -> RefdbResult<()> {
        if !force && self.exists(new)? {
            return Err(RefdbError::AlreadyExists {
                name: new.to_string(),
            });
        }

        let mut cache = self.cache();
        cache.refresh(&self.packed_path())?;
        for existing in cache.names() {
            if old == Some(existing) {
                continue;
            }
            if names_collide(new, existing) {
                return Err(RefdbError::Collision {
                    name: new.to_string(),
                    existing: existing.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Two names collide when one is a proper prefix of the other with `/` at
/// the boundary: `refs/heads/x` cannot coexist with `refs/heads/x/y`, while
/// `refs/heads/x` and `refs/heads/xy` can.
fn names_collide(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
    long.len() > short.len()
        && long.starts_with(short)
        && long.as_bytes()[short.len()] == b'/'
}

/// Expand a namespace into the backend root below `repo`.
///
/// Each `/`-separated segment nests another `refs/namespaces/<segment>`
/// level: namespace `a/b` roots at
/// `<repo>/refs/namespaces/a/refs/namespaces/b`.
fn namespace_root(repo: &Path, namespace: &str) -> PathBuf {
    let mut root = repo.to_path_buf();
    for segment in namespace.split('/').filter(|s| !s.is_empty()) {
        root.push(REFS_DIR);
        root.push("namespaces");
        root.push(segment);
    }
    root
}
