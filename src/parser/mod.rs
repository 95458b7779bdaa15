//! Parsing of the serialized 7z header layout.
//!
//! `types` holds structures shaped like the wire format, `parsers` the nom
//! parsers producing them, and `interface` the zip-up of the raw pieces
//! into the [`crate::archive::ArchiveDatabase`] model.

pub mod combinators;
pub mod crc;
pub mod err;
pub mod interface;
pub mod parsers;
pub mod types;
