#![forbid(unsafe_code)]
//! A crate for reading 7zip archives.
//!
//! The focus is the container format itself: parsing the archive header into
//! an [`archive::ArchiveDatabase`], resolving each folder's coder graph, and
//! planning extraction. Byte-level decompression is delegated to pluggable
//! [`codec::Codec`] implementations keyed by method id; only the trivial
//! `Copy` method ships built in.

#![no_std]
#![allow(clippy::needless_return)]

extern crate alloc;

pub mod archive;
pub mod codec;
pub mod mix;
mod parser;
pub mod read;

pub use read::{Error, OpenOptions, SevenZReader};
