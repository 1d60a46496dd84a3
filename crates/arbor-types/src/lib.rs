//! Foundation types for the Arbor version control system.
//!
//! This crate provides the core identity types used throughout Arbor.
//! Every other Arbor crate depends on `arbor-types`.
//!
//! # Key Types
//!
//! - [`Oid`] — 160-bit content-addressed object identifier (40 hex characters)
//! - [`TypeError`] — Parse failures for the foundation types

pub mod error;
pub mod oid;

pub use error::TypeError;
pub use oid::{Oid, OID_HEX_LEN, OID_RAW_LEN};
