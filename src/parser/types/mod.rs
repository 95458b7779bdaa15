//! Structures shaped like the 7z wire format.
//!
//! These are "low-level": they mirror how data is stored in the archive,
//! not how callers want to consume it. The friendly model lives in
//! [`crate::archive`]; `parser::interface` converts between the two.

mod files_info;
mod header;
mod property_id;
mod streams_info;
pub use files_info::*;
pub use header::*;
pub use property_id::*;
pub use streams_info::*;

use alloc::vec::Vec;
use bitvec::prelude::*;

/// A boolean-per-item vector as stored in the header: packed bits,
/// most significant bit first.
pub type BoolVector = BitVec<u8, Msb0>;

/// Vendor-defined archive properties, kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveProperties {
    pub property_data: Vec<(u8, Vec<u8>)>,
}
