//! Scoped lock-file writer.
//!
//! All on-disk mutation in this crate goes through a `Lockfile`: content is
//! written to `<target>.lock`, synced, and renamed into place. The rename is
//! the commit point. If the lockfile is dropped without `commit`, the lock
//! is removed and the target is untouched; an already-present `.lock` file
//! means another writer holds the path and acquisition fails.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Extension appended to the target path while the write is in flight.
const LOCK_SUFFIX: &str = ".lock";

/// An exclusive, crash-safe writer for a single file.
#[derive(Debug)]
pub(crate) struct Lockfile {
    target: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
}

impl Lockfile {
    /// Take the lock for `target`, creating parent directories as needed.
    ///
    /// Fails with `AlreadyExists` if another writer holds the lock.
    pub fn acquire(target: &Path) -> io::Result<Self> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut os = target.as_os_str().to_os_string();
        os.push(LOCK_SUFFIX);
        let lock_path = PathBuf::from(os);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)?;

        Ok(Self {
            target: target.to_path_buf(),
            lock_path,
            file: Some(file),
        })
    }

    /// Append bytes to the pending content.
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(data),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "lock file already committed",
            )),
        }
    }

    /// Sync the content and rename it into place.
    pub fn commit(mut self) -> io::Result<()> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    "lock file already committed",
                ))
            }
        };

        if let Err(e) = file.sync_all() {
            drop(file);
            let _ = fs::remove_file(&self.lock_path);
            return Err(e);
        }
        drop(file);

        match fs::rename(&self.lock_path, &self.target) {
            Ok(()) => {
                debug!(target = %self.target.display(), "committed lock file");
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&self.lock_path);
                Err(e)
            }
        }
    }
}

impl Drop for Lockfile {
    fn drop(&mut self) {
        // Uncommitted: release the lock so a later writer can take it.
        if self.file.is_some() {
            self.file = None;
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_replaces_target_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("packed-refs");
        fs::write(&target, b"old").unwrap();

        let mut lock = Lockfile::acquire(&target).unwrap();
        lock.write_all(b"new").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"old");
        lock.commit().unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert!(!dir.path().join("packed-refs.lock").exists());
    }

    #[test]
    fn drop_without_commit_releases_lock_and_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("packed-refs");
        fs::write(&target, b"old").unwrap();

        {
            let mut lock = Lockfile::acquire(&target).unwrap();
            lock.write_all(b"new").unwrap();
        }

        assert_eq!(fs::read(&target).unwrap(), b"old");
        assert!(!dir.path().join("packed-refs.lock").exists());
    }

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("packed-refs");

        let _held = Lockfile::acquire(&target).unwrap();
        let err = Lockfile::acquire(&target).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn acquire_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("refs/heads/feature/auth");

        let mut lock = Lockfile::acquire(&target).unwrap();
        lock.write_all(b"content\n").unwrap();
        lock.commit().unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"content\n");
    }
}
