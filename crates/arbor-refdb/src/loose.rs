//! The loose reference file codec.
//!
//! A loose reference is one file whose path below the backend root equals
//! the reference name. Content is either a 40-hex object id (direct) or
//! `ref: <name>` (symbolic), newline-terminated on write, whitespace-tolerant
//! on read.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use arbor_types::{Oid, OID_HEX_LEN};
use tracing::debug;

use crate::error::{RefdbError, RefdbResult};
use crate::lockfile::Lockfile;
use crate::packed::PackedEntry;
use crate::types::{RefTarget, Reference};

/// Prefix marking a symbolic reference file.
pub(crate) const SYMREF_PREFIX: &str = "ref: ";

/// Filesystem path of the loose file for `name`.
pub(crate) fn ref_path(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

/// Read the loose reference `name`, or `None` if there is no loose file.
pub(crate) fn read(root: &Path, name: &str) -> RefdbResult<Option<RefTarget>> {
    let path = ref_path(root, name);
    match fs::read(&path) {
        Ok(bytes) => parse(&bytes, &path).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read the loose reference `name` as a compaction candidate.
///
/// Compaction folds loose values into the packed store, whose entries carry
/// a direct object id; a symbolic loose file cannot be represented there and
/// is reported as corrupt.
pub(crate) fn read_packed(root: &Path, name: &str) -> RefdbResult<PackedEntry> {
    let path = ref_path(root, name);
    let bytes = fs::read(&path)?;
    let oid = parse_oid(&bytes, &path)?;

    let mut entry = PackedEntry::new(name, oid);
    entry.flags.was_loose = true;
    Ok(entry)
}

/// Decode loose file content.
pub(crate) fn parse(bytes: &[u8], path: &Path) -> RefdbResult<RefTarget> {
    if bytes.starts_with(SYMREF_PREFIX.as_bytes()) {
        let target = std::str::from_utf8(&bytes[SYMREF_PREFIX.len()..])
            .map_err(|_| corrupt(path))?
            .trim_end();
        if target.is_empty() {
            return Err(corrupt(path));
        }
        return Ok(RefTarget::symbolic(target));
    }

    Ok(RefTarget::direct(parse_oid(bytes, path)?))
}

/// Decode the direct form: 40 hex characters, then nothing or whitespace.
pub(crate) fn parse_oid(bytes: &[u8], path: &Path) -> RefdbResult<Oid> {
    if bytes.len() < OID_HEX_LEN {
        return Err(corrupt(path));
    }

    let hex = std::str::from_utf8(&bytes[..OID_HEX_LEN]).map_err(|_| corrupt(path))?;
    let oid = Oid::from_hex(hex).map_err(|_| corrupt(path))?;

    // If the file is longer than 40 characters, the 41st must be whitespace.
    if bytes.len() > OID_HEX_LEN && !bytes[OID_HEX_LEN].is_ascii_whitespace() {
        return Err(corrupt(path));
    }

    Ok(oid)
}

/// Serialize a target into loose file content.
pub(crate) fn serialize(target: &RefTarget) -> String {
    match target {
        RefTarget::Direct { oid, .. } => format!("{oid}\n"),
        RefTarget::Symbolic { target } => format!("{SYMREF_PREFIX}{target}\n"),
    }
}

/// Write `reference` as a loose file under `root`.
///
/// An empty directory sitting at the target path is removed first; a
/// non-empty one makes the removal (and so the write) fail. The content is
/// committed with the lock-file discipline.
pub(crate) fn write(root: &Path, reference: &Reference) -> RefdbResult<()> {
    let path = ref_path(root, &reference.name);

    if path.is_dir() {
        fs::remove_dir(&path)?;
    }

    let mut lock = Lockfile::acquire(&path)?;
    lock.write_all(serialize(&reference.target).as_bytes())?;
    lock.commit()?;

    debug!(name = %reference.name, "wrote loose reference");
    Ok(())
}

fn corrupt(path: &Path) -> RefdbError {
    RefdbError::CorruptLoose {
        path: path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn oid(hex: &str) -> Oid {
        Oid::from_hex(hex).unwrap()
    }

    fn probe() -> PathBuf {
        PathBuf::from("refs/heads/main")
    }

    #[test]
    fn parse_direct() {
        let target = parse(format!("{A}\n").as_bytes(), &probe()).unwrap();
        assert_eq!(target, RefTarget::direct(oid(A)));
    }

    #[test]
    fn parse_direct_without_newline() {
        let target = parse(A.as_bytes(), &probe()).unwrap();
        assert_eq!(target.oid(), Some(oid(A)));
    }

    #[test]
    fn parse_direct_with_trailing_whitespace() {
        let target = parse(format!("{A} \t\n").as_bytes(), &probe()).unwrap();
        assert_eq!(target.oid(), Some(oid(A)));
    }

    #[test]
    fn parse_symbolic() {
        let target = parse(b"ref: refs/heads/main\n", &probe()).unwrap();
        assert_eq!(target, RefTarget::symbolic("refs/heads/main"));
    }

    #[test]
    fn parse_symbolic_without_newline() {
        let target = parse(b"ref: refs/heads/main", &probe()).unwrap();
        assert_eq!(target.symbolic_target(), Some("refs/heads/main"));
    }

    #[test]
    fn short_content_is_corrupt() {
        let err = parse(b"abc123\n", &probe()).unwrap_err();
        assert!(matches!(err, RefdbError::CorruptLoose { .. }));
    }

    #[test]
    fn non_hex_content_is_corrupt() {
        let bad = "z".repeat(OID_HEX_LEN);
        let err = parse(bad.as_bytes(), &probe()).unwrap_err();
        assert!(matches!(err, RefdbError::CorruptLoose { .. }));
    }

    #[test]
    fn trailing_garbage_is_corrupt() {
        let err = parse(format!("{A}x").as_bytes(), &probe()).unwrap_err();
        assert!(matches!(err, RefdbError::CorruptLoose { .. }));
    }

    #[test]
    fn empty_symbolic_target_is_corrupt() {
        let err = parse(b"ref: \n", &probe()).unwrap_err();
        assert!(matches!(err, RefdbError::CorruptLoose { .. }));
    }

    #[test]
    fn serialize_forms() {
        assert_eq!(serialize(&RefTarget::direct(oid(A))), format!("{A}\n"));
        assert_eq!(
            serialize(&RefTarget::symbolic("refs/heads/main")),
            "ref: refs/heads/main\n"
        );
    }

    #[test]
    fn write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let reference = Reference::direct("refs/heads/main", oid(A));

        write(dir.path(), &reference).unwrap();
        let target = read(dir.path(), "refs/heads/main").unwrap().unwrap();
        assert_eq!(target.oid(), Some(oid(A)));
    }

    #[test]
    fn read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(dir.path(), "refs/heads/absent").unwrap().is_none());
    }

    #[test]
    fn write_removes_empty_directory_in_the_way() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("refs/heads/main")).unwrap();

        let reference = Reference::direct("refs/heads/main", oid(A));
        write(dir.path(), &reference).unwrap();
        assert!(dir.path().join("refs/heads/main").is_file());
    }

    #[test]
    fn write_fails_on_non_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("refs/heads/main/child")).unwrap();

        let reference = Reference::direct("refs/heads/main", oid(A));
        let err = write(dir.path(), &reference).unwrap_err();
        assert!(matches!(err, RefdbError::Io(_)));
    }

    #[test]
    fn read_packed_marks_was_loose() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), &Reference::direct("refs/heads/main", oid(A))).unwrap();

        let entry = read_packed(dir.path(), "refs/heads/main").unwrap();
        assert_eq!(entry.name, "refs/heads/main");
        assert_eq!(entry.oid, oid(A));
        assert!(entry.flags.was_loose);
    }

    #[test]
    fn read_packed_rejects_symbolic() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), &Reference::symbolic("refs/heads/alias", "refs/heads/main")).unwrap();

        let err = read_packed(dir.path(), "refs/heads/alias").unwrap_err();
        assert!(matches!(err, RefdbError::CorruptLoose { .. }));
    }
}
