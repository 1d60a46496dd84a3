use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length of an [`Oid`] in raw bytes.
pub const OID_RAW_LEN: usize = 20;

/// Length of an [`Oid`] in hexadecimal characters.
pub const OID_HEX_LEN: usize = 40;

/// Identifier naming an immutable object in the object database.
///
/// An `Oid` is a 160-bit content hash. Its canonical text form is exactly
/// 40 lowercase hexadecimal characters; parsing rejects anything else,
/// including uppercase digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Oid([u8; OID_RAW_LEN]);

impl Oid {
    /// Create an `Oid` from a pre-computed raw hash.
    pub const fn from_raw(raw: [u8; OID_RAW_LEN]) -> Self {
        Self(raw)
    }

    /// Parse the canonical 40-character lowercase hex form.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != OID_HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: OID_HEX_LEN,
                actual: s.len(),
            });
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(TypeError::InvalidHex(s.to_string()));
        }

        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let mut raw = [0u8; OID_RAW_LEN];
        raw.copy_from_slice(&bytes);
        Ok(Self(raw))
    }

    /// The raw 20-byte hash.
    pub fn as_bytes(&self) -> &[u8; OID_RAW_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.short_hex())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; OID_RAW_LEN]> for Oid {
    fn from(raw: [u8; OID_RAW_LEN]) -> Self {
        Self(raw)
    }
}

impl From<Oid> for [u8; OID_RAW_LEN] {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}
