//! Custom nom parsers for the 7z format.

mod bit;
pub use bit::*;
mod sevenz_uint64;
pub use sevenz_uint64::*;
mod coders_info;
pub use coders_info::*;
mod streams_info;
pub use streams_info::*;
mod files_info;
pub use files_info::*;
mod header;
pub use header::*;
#[cfg(test)]
mod test;

use super::crc;
use super::err::*;
use super::types::*;

use nom::bytes::complete::{tag, take};
use nom::error::context;
use nom::number::complete::{le_u32, le_u64, u8};

/// Header magic bytes.
pub const MAGIC: [u8; 6] = [b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C];

pub fn archive_version(input: &[u8]) -> SevenZResult<ArchiveVersion> {
    let (input, major) = context("archive_version major", u8)(input)?;
    let (input, minor) = context("archive_version minor", u8)(input)?;
    return Ok((input, ArchiveVersion { major, minor }));
}

pub fn start_header(input: &[u8]) -> SevenZResult<StartHeader> {
    let (input, next_header_offset) = context("start_header next_header_offset", le_u64)(input)?;
    let (input, next_header_size) = context("start_header next_header_size", le_u64)(input)?;
    let (input, next_header_crc) = context("start_header next_header_crc", le_u32)(input)?;
    return Ok((
        input,
        StartHeader {
            next_header_offset,
            next_header_size,
            next_header_crc,
        },
    ));
}

pub fn signature_header(input: &[u8]) -> SevenZResult<SignatureHeader> {
    let (input, _) = context("signature_header magic bytes", tag(MAGIC))(input)?;
    let (input, archive_version) =
        context("signature_header archive_version", archive_version)(input)?;
    let (input, start_header_crc) = context("signature_header start_header_crc", le_u32)(input)?;
    let (_, raw_start_header) = context(
        "signature_header raw_start_header",
        take(START_HEADER_LEN),
    )(input)?;
    let (input, start_header) = context("signature_header start_header", start_header)(input)?;

    let calculated_crc = crc::sevenz_crc(raw_start_header);
    if calculated_crc != start_header_crc {
        return parse_failure(SevenZParserErrorKind::Crc {
            expected: start_header_crc,
            got: calculated_crc,
        });
    }

    return Ok((
        input,
        SignatureHeader {
            archive_version,
            start_header_crc,
            start_header,
        },
    ));
}

pub fn bool_byte(input: &[u8]) -> SevenZResult<bool> {
    let (input, byte) = context("bool_byte byte", u8)(input)?;
    return match byte {
        0 => Ok((input, false)),
        1 => Ok((input, true)),
        _ => parse_failure(SevenZParserErrorKind::InvalidBooleanByte(byte)),
    };
}

pub fn property_id(input: &[u8]) -> SevenZResult<PropertyId> {
    let (input, p_u8) = context("property_id", u8)(input)?;
    match PropertyId::try_from(p_u8) {
        Ok(p) => return Ok((input, p)),
        Err(_) => return parse_error(SevenZParserErrorKind::InvalidPropertyId(p_u8)),
    }
}

/// Skip a size-prefixed property body.
pub fn skip_property_data(input: &[u8]) -> SevenZResult<()> {
    let (input, len) = context("skipped property size", sevenz_uint64_as_usize)(input)?;
    let (input, _) = context("skipped property data", take(len))(input)?;
    return Ok((input, ()));
}

/// Skip size-prefixed properties until the wanted id turns up. Reaching
/// the section's end marker first means a mandatory property is missing.
pub fn wait_for_property_id(input: &[u8], wanted: PropertyId) -> SevenZResult<()> {
    let mut input_mut = input;
    loop {
        let (input, id) = context("property id", u8)(input_mut)?;
        input_mut = input;
        if id == wanted as u8 {
            return Ok((input_mut, ()));
        }
        if id == PropertyId::End as u8 {
            return parse_failure(SevenZParserErrorKind::MissingProperty(wanted as u8));
        }
        log::debug!("skipping property 0x{:02x} while waiting for 0x{:02x}", id, wanted as u8);
        let (input, _) = skip_property_data(input_mut)?;
        input_mut = input;
    }
}

/// Reject counts that could not possibly fit in the remaining input.
/// Every counted element occupies at least one byte, so this bounds
/// allocations by the input length before any `Vec` is reserved.
pub fn check_count(input: &[u8], count: usize) -> Result<(), nom::Err<SevenZParserError>> {
    if count > input.len() {
        return Err(nom::Err::Failure(SevenZParserError::new(
            SevenZParserErrorKind::CountTooLarge {
                count,
                remaining: input.len(),
            },
        )));
    }
    return Ok(());
}
