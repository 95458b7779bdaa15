use crate::archive::FolderError;

use alloc::vec::Vec;
use core::fmt;

use nom::error::{ContextError, ErrorKind, ParseError};

/// The kinds of defects the header parser can report.
///
/// Any of them means the header cannot be trusted; parsing is never resumed
/// past one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SevenZParserErrorKind {
    /// A low-level nom combinator failed (truncated input, bad tag…).
    Syntax(ErrorKind),
    Crc { expected: u32, got: u32 },
    InvalidPropertyId(u8),
    UnexpectedPropertyId(u8),
    /// A mandatory property is missing from its section.
    MissingProperty(u8),
    InvalidBooleanByte(u8),
    /// A count in the header does not fit this platform's `usize`.
    UsizeOverflow,
    /// A declared element count exceeds what the remaining input could hold.
    CountTooLarge { count: usize, remaining: usize },
    /// The header points at data stored outside the header stream.
    ExternalDataUnsupported,
    /// Multi-file folders without a substream size block.
    MissingSubStreamSizes,
    /// Substream sizes of a folder exceed the folder's unpack size.
    SubStreamSizeOverflow,
    /// A folder without coders, or with fewer inputs than bind pairs.
    EmptyFolder,
    InconsistentStreamCounts,
    DummyNotAllZeroes,
    /// The name block does not hold exactly one name per file.
    NamesMismatch,
    NameNotUtf16,
    Folder(FolderError),
}

impl fmt::Display for SevenZParserErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SevenZParserErrorKind::*;
        match self {
            Syntax(kind) => write!(f, "syntax error ({})", kind.description()),
            Crc { expected, got } => {
                write!(f, "CRC mismatch (header: {:08x}, computed: {:08x})", expected, got)
            }
            InvalidPropertyId(id) => write!(f, "invalid property id 0x{:02x}", id),
            UnexpectedPropertyId(id) => write!(f, "unexpected property id 0x{:02x}", id),
            MissingProperty(id) => write!(f, "mandatory property 0x{:02x} missing", id),
            InvalidBooleanByte(b) => write!(f, "invalid boolean byte 0x{:02x}", b),
            UsizeOverflow => write!(f, "count does not fit usize"),
            CountTooLarge { count, remaining } => {
                write!(f, "count {} exceeds {} remaining bytes", count, remaining)
            }
            ExternalDataUnsupported => write!(f, "externally stored data is not supported"),
            MissingSubStreamSizes => write!(f, "multi-file folder without substream sizes"),
            SubStreamSizeOverflow => write!(f, "substream sizes exceed folder size"),
            EmptyFolder => write!(f, "folder declares no coders"),
            InconsistentStreamCounts => write!(f, "folder stream counts are inconsistent"),
            DummyNotAllZeroes => write!(f, "dummy property contains non-zero bytes"),
            NamesMismatch => write!(f, "name block does not match the file count"),
            NameNotUtf16 => write!(f, "file name is not valid UTF-16"),
            Folder(e) => write!(f, "{}", e),
        }
    }
}

/// The error type returned by all parsers.
///
/// Owns no part of the input, so it survives the buffer it was produced
/// from — needed when a decoded packed header is parsed from a transient
/// allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SevenZParserError {
    pub kind: SevenZParserErrorKind,
    /// Context labels accumulated while unwinding, innermost first.
    pub ctx: Vec<&'static str>,
}

impl SevenZParserError {
    pub fn new(kind: SevenZParserErrorKind) -> Self {
        return SevenZParserError {
            kind,
            ctx: Vec::new(),
        };
    }
}

impl fmt::Display for SevenZParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(outermost) = self.ctx.last() {
            write!(f, " while reading {}", outermost)?;
        }
        return Ok(());
    }
}

impl<I> ParseError<I> for SevenZParserError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        return SevenZParserError::new(SevenZParserErrorKind::Syntax(kind));
    }

    fn append(_: I, _: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<I> ContextError<I> for SevenZParserError {
    fn add_context(_input: I, ctx: &'static str, mut other: Self) -> Self {
        other.ctx.push(ctx);
        return other;
    }
}

/// The result type returned by all parsers.
pub type SevenZResult<'a, T> = nom::IResult<&'a [u8], T, SevenZParserError>;

/// A recoverable error: combinators like `opt` may backtrack over it.
pub fn parse_error<T>(kind: SevenZParserErrorKind) -> Result<T, nom::Err<SevenZParserError>> {
    return Err(nom::Err::Error(SevenZParserError::new(kind)));
}

/// An unrecoverable error: the header is structurally broken.
pub fn parse_failure<T>(kind: SevenZParserErrorKind) -> Result<T, nom::Err<SevenZParserError>> {
    return Err(nom::Err::Failure(SevenZParserError::new(kind)));
}

/// Convert a u64 read from the header to usize, or fail the parse.
#[macro_export]
macro_rules! to_usize_or_err {
    ($x:expr) => {
        match ::core::convert::TryFrom::try_from($x) {
            Ok(res) => res,
            Err(_) => {
                return Err(nom::Err::Failure(
                    $crate::parser::err::SevenZParserError::new(
                        $crate::parser::err::SevenZParserErrorKind::UsizeOverflow,
                    ),
                ))
            }
        }
    };
}
