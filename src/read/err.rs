//! The top-level error types of this crate.

use crate::archive::FormatError;
use crate::codec::CodecError;

pub use crate::parser::err::{SevenZParserError, SevenZParserErrorKind};

use alloc::string::String;

use thiserror::Error;

/// Errors fatal to opening an archive or to a whole extraction request.
///
/// `NotSevenZ` is kept apart from the corrupt-header kinds so callers can
/// tell "wrong file type" from "damaged archive".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("not a 7z archive")]
    NotSevenZ,
    #[error("archive truncated: {0}")]
    Truncated(&'static str),
    #[error("corrupt 7z header: {0}")]
    Header(SevenZParserError),
    #[error("corrupt 7z structure: {0}")]
    Format(#[from] FormatError),
    #[error("failed to decode packed header: {0}")]
    HeaderDecode(CodecError),
    #[error("open limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error("file index {0} out of range")]
    FileIndexOutOfRange(usize),
    #[error("no such file in archive: {0}")]
    NoSuchFile(String),
    #[error("extraction failed: {0}")]
    Extract(ExtractError),
}

impl From<nom::Err<SevenZParserError>> for Error {
    fn from(e: nom::Err<SevenZParserError>) -> Self {
        match e {
            nom::Err::Incomplete(_) => return Error::Truncated("header needs more input"),
            nom::Err::Error(e) | nom::Err::Failure(e) => return Error::Header(e),
        }
    }
}

/// Per-file extraction failures. Files in other folders are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("packed stream {index} failed its CRC check")]
    PackCrcMismatch { index: usize },
}
