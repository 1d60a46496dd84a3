//! The packed references file codec.
//!
//! The packed file aggregates many references into one line-oriented UTF-8
//! text file. Each entry is a 40-hex object id, a single space, and the
//! reference name; a tag entry may be followed by a `^`-prefixed peel line
//! naming the non-tag object its tag chain resolves to:
//!
//! ```text
//! # pack-refs with: peeled fully-peeled
//! 6fa8a902cc1d18527e1355773c86721945475d37 refs/tags/v0.4
//! ^2ec0cb7959b0bf965d54f95453f5b4b34e8d3100
//! ```
//!
//! The optional first line is a traits header; `peeled` and `fully-peeled`
//! declare how much peeling the writer performed, which decides how entries
//! without a peel line are flagged on load. Any other leading `#` lines are
//! comments. Lines end in `\n` (`\r\n` is tolerated); the final entry or
//! peel line may end at the end of the buffer instead.

use arbor_types::{Oid, OID_HEX_LEN};

use crate::error::{RefdbError, RefdbResult};

/// Header line emitted at the top of every packed file this codec writes.
///
/// The writer always fully peels before emitting, so it always claims both
/// traits. The trailing space is part of the historical format.
pub const PACKED_REFS_HEADER: &str = "# pack-refs with: peeled fully-peeled ";

/// Prefix identifying the traits header.
const TRAITS_PREFIX: &str = "# pack-refs with: ";

/// Name prefix of the tag namespace, the domain of `peeled` mode.
const TAGS_PREFIX: &str = "refs/tags/";

/// Per-entry state flags.
///
/// `has_peel` and `cannot_peel` are mutually exclusive; `was_loose` crosses
/// freely with both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackedFlags {
    /// The entry's `peel` field is populated and authoritative.
    pub has_peel: bool,
    /// Peeling was attempted or declared impossible for this entry.
    pub cannot_peel: bool,
    /// The entry was absorbed from a loose file in the current compaction
    /// and the loose original is scheduled for deletion.
    pub was_loose: bool,
}

/// How much peeling the packed file's writer declared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PeelingMode {
    /// No traits header: nothing can be inferred from a missing peel line.
    #[default]
    None,
    /// `peeled`: every tag-namespace entry without a peel line is unpeelable.
    Standard,
    /// `fully-peeled`: every entry without a peel line is unpeelable.
    Full,
}

/// One record of the packed store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedEntry {
    /// Reference name.
    pub name: String,
    /// The directly referenced object.
    pub oid: Oid,
    /// The resolved non-tag object, when `flags.has_peel` is set.
    pub peel: Option<Oid>,
    /// State flags.
    pub flags: PackedFlags,
}

impl PackedEntry {
    /// Create an unpeeled entry.
    pub fn new(name: impl Into<String>, oid: Oid) -> Self {
        Self {
            name: name.into(),
            oid,
            peel: None,
            flags: PackedFlags::default(),
        }
    }
}

fn corrupt(reason: impl Into<String>) -> RefdbError {
    RefdbError::CorruptPacked {
        reason: reason.into(),
    }
}

fn parse_oid_field(bytes: &[u8]) -> RefdbResult<Oid> {
    let text =
        std::str::from_utf8(bytes).map_err(|_| corrupt("object id is not valid text"))?;
    Oid::from_hex(text).map_err(|_| corrupt("object id is not 40 lowercase hex characters"))
}

/// Parse a packed references file.
///
/// Returns the entries in file order (already flagged according to the
/// declared peeling mode) and the mode itself. Any malformation is
/// `CorruptPacked`; the caller is expected to discard all entries on error.
pub fn parse(data: &[u8]) -> RefdbResult<(Vec<PackedEntry>, PeelingMode)> {
    let mut entries: Vec<PackedEntry> = Vec::new();
    let mut mode = PeelingMode::None;
    let mut pos = 0;

    if data.starts_with(TRAITS_PREFIX.as_bytes()) {
        let rest = &data[TRAITS_PREFIX.len()..];
        let nl = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| corrupt("traits header has no terminating newline"))?;
        let traits = String::from_utf8_lossy(&rest[..nl]);
        if traits.split_whitespace().any(|t| t == "fully-peeled") {
            mode = PeelingMode::Full;
        } else if traits.split_whitespace().any(|t| t == "peeled") {
            mode = PeelingMode::Standard;
        }
        pos = TRAITS_PREFIX.len() + nl + 1;
    }

    // Remaining leading comment lines.
    while pos < data.len() && data[pos] == b'#' {
        let nl = data[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| corrupt("comment line has no terminating newline"))?;
        pos += nl + 1;
    }

    // Entries, each optionally followed by one peel line.
    while pos < data.len() {
        if data[pos] == b'^' {
            return Err(corrupt("peel line without a preceding reference"));
        }

        let (mut entry, next) = parse_entry_line(data, pos)?;
        pos = next;

        if pos < data.len() && data[pos] == b'^' {
            let (peel, next) = parse_peel_line(data, pos)?;
            entry.peel = Some(peel);
            entry.flags.has_peel = true;
            pos = next;
        } else if mode == PeelingMode::Full
            || (mode == PeelingMode::Standard && entry.name.starts_with(TAGS_PREFIX))
        {
            entry.flags.cannot_peel = true;
        }

        entries.push(entry);
    }

    Ok((entries, mode))
}

fn parse_entry_line(data: &[u8], pos: usize) -> RefdbResult<(PackedEntry, usize)> {
    // 40 hex characters, one separator, at least one name byte.
    if pos + OID_HEX_LEN >= data.len() {
        return Err(corrupt("truncated reference line"));
    }
    let oid = parse_oid_field(&data[pos..pos + OID_HEX_LEN])?;
    if data[pos + OID_HEX_LEN] != b' ' {
        return Err(corrupt("expected a single space after the object id"));
    }

    let name_start = pos + OID_HEX_LEN + 1;
    if name_start >= data.len() {
        return Err(corrupt("truncated reference line"));
    }
    let (mut name_end, next) = match data[name_start..].iter().position(|&b| b == b'\n') {
        Some(nl) => (name_start + nl, name_start + nl + 1),
        None => (data.len(), data.len()),
    };
    if name_end > name_start && data[name_end - 1] == b'\r' {
        name_end -= 1;
    }
    if name_end == name_start {
        return Err(corrupt("empty reference name"));
    }

    let name = std::str::from_utf8(&data[name_start..name_end])
        .map_err(|_| corrupt("reference name is not valid text"))?
        .to_string();

    Ok((PackedEntry::new(name, oid), next))
}

fn parse_peel_line(data: &[u8], pos: usize) -> RefdbResult<(Oid, usize)> {
    let hex_start = pos + 1;
    if hex_start + OID_HEX_LEN > data.len() {
        return Err(corrupt("truncated peel line"));
    }
    let peel = parse_oid_field(&data[hex_start..hex_start + OID_HEX_LEN])?;

    let mut end = hex_start + OID_HEX_LEN;
    if end < data.len() && data[end] == b'\r' {
        end += 1;
    }
    if end < data.len() {
        if data[end] != b'\n' {
            return Err(corrupt("malformed peel line"));
        }
        end += 1;
    }
    Ok((peel, end))
}

/// Serialize entries into packed file bytes.
///
/// Entries are emitted sorted ascending by name (bytewise). Entries flagged
/// `has_peel` get a `^<peel>` continuation line.
pub fn emit<'a>(entries: impl IntoIterator<Item = &'a PackedEntry>) -> Vec<u8> {
    let mut sorted: Vec<&PackedEntry> = entries.into_iter().collect();
    sorted.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

    let mut out = String::new();
    out.push_str(PACKED_REFS_HEADER);
    out.push('\n');
    for entry in sorted {
        out.push_str(&entry.oid.to_hex());
        out.push(' ');
        out.push_str(&entry.name);
        out.push('\n');
        if entry.flags.has_peel {
            if let Some(peel) = entry.peel {
                out.push('^');
                out.push_str(&peel.to_hex());
                out.push('\n');
            }
        }
    }
    out.into_bytes()
}
