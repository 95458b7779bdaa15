use super::*;

use alloc::vec::Vec;

/// Vendor-defined archive properties: `(id, size, data)` triples until the
/// end marker. Kept opaque. The caller has consumed the section's property
/// id.
pub fn archive_properties(input: &[u8]) -> SevenZResult<ArchiveProperties> {
    let mut props: Vec<(u8, Vec<u8>)> = Vec::new();
    let mut input_mut = input;
    loop {
        let (input, id) = context("archive property id", u8)(input_mut)?;
        input_mut = input;
        if id == PropertyId::End as u8 {
            break;
        }
        let (input, len) = context("archive property size", sevenz_uint64_as_usize)(input_mut)?;
        let (input, data) = context("archive property data", take(len))(input)?;
        input_mut = input;
        props.push((id, Vec::from(data)));
    }
    return Ok((
        input_mut,
        ArchiveProperties {
            property_data: props,
        },
    ));
}

/// The header property tree. The caller has consumed `PropertyId::Header`.
pub fn header(input: &[u8]) -> SevenZResult<Header> {
    let mut parsed = Header::default();

    let mut input_mut = input;
    loop {
        let (input, id) = context("header property id", u8)(input_mut)?;
        input_mut = input;

        if id == PropertyId::End as u8 {
            break;
        } else if id == PropertyId::ArchiveProperties as u8 {
            let (input, props) =
                context("header archive_properties", archive_properties)(input_mut)?;
            input_mut = input;
            parsed.archive_properties = Some(props);
        } else if id == PropertyId::AdditionalStreamsInfo as u8 {
            let (input, streams) = context("header additional_streams", streams_info)(input_mut)?;
            input_mut = input;
            parsed.additional_streams = Some(streams);
        } else if id == PropertyId::MainStreamsInfo as u8 {
            let (input, streams) = context("header main_streams", streams_info)(input_mut)?;
            input_mut = input;
            parsed.main_streams = Some(streams);
        } else if id == PropertyId::FilesInfo as u8 {
            let (input, files) = context("header files_info", files_info)(input_mut)?;
            input_mut = input;
            parsed.files = Some(files);
        } else {
            return parse_failure(SevenZParserErrorKind::UnexpectedPropertyId(id));
        }
    }

    return Ok((input_mut, parsed));
}

/// Dispatch on what the next-header bytes contain: the metadata itself, or
/// the streams info describing a compressed copy of it.
pub fn next_header(input: &[u8]) -> SevenZResult<NextHeader> {
    let (input, id) = context("next header property id", property_id)(input)?;
    match id {
        PropertyId::Header => {
            let (input, parsed) = context("next header plain", header)(input)?;
            return Ok((input, NextHeader::Plain(parsed)));
        }
        PropertyId::EncodedHeader => {
            let (input, streams) = context("next header encoded", streams_info)(input)?;
            return Ok((input, NextHeader::Encoded(streams)));
        }
        other => return parse_failure(SevenZParserErrorKind::UnexpectedPropertyId(other as u8)),
    }
}
