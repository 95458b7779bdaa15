use super::*;
use crate::archive::{AltCoder, BindPair, CoderInfo, Folder};

use alloc::vec::Vec;

use nom::multi::count;
use nom::sequence::pair;

/// One coder entry: a flags byte, the method id, optional stream counts
/// and properties — repeated while the flags byte announces another
/// alternative method variant.
pub fn coder(input: &[u8]) -> SevenZResult<CoderInfo> {
    fn id_len(flags: u8) -> usize {
        (flags & 0x0F) as usize
    }
    fn is_complex(flags: u8) -> bool {
        (flags & 0x10) != 0
    }
    fn has_attrs(flags: u8) -> bool {
        (flags & 0x20) != 0
    }
    fn has_more_alts(flags: u8) -> bool {
        (flags & 0x80) != 0
    }

    let mut alt_coders: Vec<AltCoder> = Vec::new();
    let mut num_in_streams = 1;
    let mut num_out_streams = 1;

    let mut input_mut = input;
    loop {
        let (input, flags) = context("coder flags", u8)(input_mut)?;
        let (input, method_id) = context("coder method id", take(id_len(flags)))(input)?;
        input_mut = input;

        if is_complex(flags) {
            let (input, n_in) = context("coder in-stream count", sevenz_uint64_as_usize)(input_mut)?;
            let (input, n_out) = context("coder out-stream count", sevenz_uint64_as_usize)(input)?;
            num_in_streams = n_in;
            num_out_streams = n_out;
            input_mut = input;
        } else {
            num_in_streams = 1;
            num_out_streams = 1;
        }

        let mut properties = None;
        if has_attrs(flags) {
            let (input, len) = context("coder properties size", sevenz_uint64_as_usize)(input_mut)?;
            check_count(input, len)?;
            let (input, props) = context("coder properties", take(len))(input)?;
            properties = Some(Vec::from(props));
            input_mut = input;
        }

        alt_coders.push(AltCoder {
            method_id: Vec::from(method_id),
            properties,
        });

        if !has_more_alts(flags) {
            break;
        }
    }

    return Ok((
        input_mut,
        CoderInfo {
            num_in_streams,
            num_out_streams,
            alt_coders,
        },
    ));
}

/// One folder: its coders, the bind pairs wiring them together, and the
/// pack-stream indices feeding the free inputs. Unpack sizes and the CRC
/// are filled in later by [`unpack_info`].
pub fn folder(input: &[u8]) -> SevenZResult<Folder> {
    let (input, num_coders) = context("folder coder count", sevenz_uint64_as_usize)(input)?;
    if num_coders == 0 {
        return parse_failure(SevenZParserErrorKind::EmptyFolder);
    }
    check_count(input, num_coders)?;
    let (input, coders) = context("folder coders", count(coder, num_coders))(input)?;

    let total_out: usize = coders.iter().map(|c| c.num_out_streams).sum();
    let total_in: usize = coders.iter().map(|c| c.num_in_streams).sum();
    let num_bind_pairs = match total_out.checked_sub(1) {
        Some(n) => n,
        None => return parse_failure(SevenZParserErrorKind::InconsistentStreamCounts),
    };

    check_count(input, num_bind_pairs)?;
    let (input, bind_pairs) = context(
        "folder bind pairs",
        count(
            nom::combinator::map(pair(sevenz_uint64, sevenz_uint64), |(in_index, out_index)| {
                BindPair {
                    in_index,
                    out_index,
                }
            }),
            num_bind_pairs,
        ),
    )(input)?;

    let num_packed = match total_in.checked_sub(num_bind_pairs) {
        Some(n) => n,
        None => return parse_failure(SevenZParserErrorKind::InconsistentStreamCounts),
    };

    // A single free input has an implied index; only multiple free inputs
    // are spelled out in the header.
    let mut folder = Folder {
        coders,
        bind_pairs,
        ..Folder::default()
    };
    let input = if num_packed == 1 {
        let free = (0..total_in as u64)
            .find(|&idx| folder.find_bind_pair_for_in_stream(idx).is_none());
        match free {
            Some(idx) => folder.pack_streams.push(idx),
            None => return parse_failure(SevenZParserErrorKind::InconsistentStreamCounts),
        }
        input
    } else {
        check_count(input, num_packed)?;
        let (input, indices) = context(
            "folder pack stream indices",
            count(sevenz_uint64, num_packed),
        )(input)?;
        folder.pack_streams = indices;
        input
    };

    return Ok((input, folder));
}

/// The unpack-info section: folder definitions followed by their output
/// sizes and optional folder CRCs. The caller has consumed the section's
/// property id.
pub fn unpack_info(input: &[u8]) -> SevenZResult<Vec<Folder>> {
    let (input, _) = context(
        "unpack_info PropertyId::Folder",
        |x| wait_for_property_id(x, PropertyId::Folder),
    )(input)?;

    let (input, num_folders) = context("unpack_info folder count", sevenz_uint64_as_usize)(input)?;
    check_count(input, num_folders)?;

    let (input, external) = context("unpack_info external flag", bool_byte)(input)?;
    if external {
        return parse_failure(SevenZParserErrorKind::ExternalDataUnsupported);
    }

    let (input, mut folders) =
        context("unpack_info folders", count(folder, num_folders))(input)?;

    let (input, _) = context(
        "unpack_info PropertyId::CodersUnpackSize",
        |x| wait_for_property_id(x, PropertyId::CodersUnpackSize),
    )(input)?;

    let mut input_mut = input;
    for folder in folders.iter_mut() {
        let num_sizes = folder.num_out_streams();
        check_count(input_mut, num_sizes)?;
        for _ in 0..num_sizes {
            let (input, size) = context("coder unpack size", sevenz_uint64)(input_mut)?;
            input_mut = input;
            folder.unpack_sizes.push(size);
        }
    }

    loop {
        let (input, id) = context("unpack_info property id", u8)(input_mut)?;
        input_mut = input;
        if id == PropertyId::End as u8 {
            break;
        }
        if id == PropertyId::Crc as u8 {
            let (input, crcs) = context("unpack_info folder digests", |x| {
                digests(x, folders.len())
            })(input_mut)?;
            input_mut = input;
            for (folder, crc) in folders.iter_mut().zip(crcs) {
                folder.unpack_crc = crc;
            }
        } else {
            let (input, _) = skip_property_data(input_mut)?;
            input_mut = input;
        }
    }

    log::trace!("parsed {} folders", folders.len());
    return Ok((input_mut, folders));
}
