use super::*;
use crate::archive::Folder;

use alloc::vec;
use alloc::vec::Vec;

use nom::multi::count;

/// The pack-info section: position and size of every raw pack stream,
/// optionally their CRCs. The caller has consumed the section's property
/// id.
pub fn pack_info(input: &[u8]) -> SevenZResult<PackInfo> {
    let (input, pack_pos) = context("pack_info pack_pos", sevenz_uint64)(input)?;
    let (input, num_pack_streams) =
        context("pack_info stream count", sevenz_uint64_as_usize)(input)?;
    check_count(input, num_pack_streams)?;

    let (input, _) = context("pack_info PropertyId::Size", |x| {
        wait_for_property_id(x, PropertyId::Size)
    })(input)?;
    let (input, sizes) = context(
        "pack_info sizes",
        count(sevenz_uint64, num_pack_streams),
    )(input)?;

    let mut crcs = vec![None; num_pack_streams];
    let mut input_mut = input;
    loop {
        let (input, id) = context("pack_info property id", u8)(input_mut)?;
        input_mut = input;
        if id == PropertyId::End as u8 {
            break;
        }
        if id == PropertyId::Crc as u8 {
            let (input, read) = context("pack_info digests", |x| digests(x, num_pack_streams))(input_mut)?;
            input_mut = input;
            crcs = read;
        } else {
            let (input, _) = skip_property_data(input_mut)?;
            input_mut = input;
        }
    }

    return Ok((
        input_mut,
        PackInfo {
            pack_pos,
            sizes,
            crcs,
        },
    ));
}

/// How many substreams each folder holds, using the default of one each
/// when the property is absent.
fn effective_stream_counts(nums: &Option<Vec<usize>>, num_folders: usize) -> Vec<usize> {
    return match nums {
        Some(v) => v.clone(),
        None => vec![1; num_folders],
    };
}

/// The substreams-info section. Resolves the wire format's shortcuts
/// against the already-parsed folders: the last substream size of every
/// folder is derived, and digests of single-substream folders with a
/// folder-level CRC are reused instead of being stored again. The caller
/// has consumed the section's property id.
pub fn substreams_info<'a>(input: &'a [u8], folders: &[Folder]) -> SevenZResult<'a, SubStreamsInfo> {
    let mut nums: Option<Vec<usize>> = None;
    let mut sizes: Option<Vec<u64>> = None;
    let mut crcs: Option<Vec<Option<u32>>> = None;

    let mut input_mut = input;
    loop {
        let (input, id) = context("substreams_info property id", u8)(input_mut)?;
        input_mut = input;

        if id == PropertyId::End as u8 {
            break;
        } else if id == PropertyId::NumUnpackStream as u8 {
            check_count(input_mut, folders.len())?;
            let (input, read) = context(
                "substreams_info stream counts",
                count(sevenz_uint64_as_usize, folders.len()),
            )(input_mut)?;
            input_mut = input;
            nums = Some(read);
        } else if id == PropertyId::Size as u8 {
            // All but the last size of each folder are stored; the last is
            // whatever remains of the folder's unpack size.
            let counts = effective_stream_counts(&nums, folders.len());
            let mut read = Vec::new();
            for (folder, &num) in folders.iter().zip(counts.iter()) {
                if num == 0 {
                    continue;
                }
                let mut sum: u64 = 0;
                for _ in 0..num - 1 {
                    let (input, size) = context("substream size", sevenz_uint64)(input_mut)?;
                    input_mut = input;
                    sum = match sum.checked_add(size) {
                        Some(s) => s,
                        None => {
                            return parse_failure(SevenZParserErrorKind::SubStreamSizeOverflow)
                        }
                    };
                    read.push(size);
                }
                let total = match folder.unpack_size() {
                    Ok(t) => t,
                    Err(e) => return parse_failure(SevenZParserErrorKind::Folder(e)),
                };
                let last = match total.checked_sub(sum) {
                    Some(l) => l,
                    None => return parse_failure(SevenZParserErrorKind::SubStreamSizeOverflow),
                };
                read.push(last);
            }
            sizes = Some(read);
        } else if id == PropertyId::Crc as u8 {
            // Digests are only stored for substreams whose CRC is not
            // already known from their folder.
            let counts = effective_stream_counts(&nums, folders.len());
            let num_unknown: usize = folders
                .iter()
                .zip(counts.iter())
                .map(|(folder, &num)| {
                    if num == 1 && folder.unpack_crc.is_some() {
                        0
                    } else {
                        num
                    }
                })
                .sum();
            let (input, unknown) =
                context("substreams_info digests", |x| digests(x, num_unknown))(input_mut)?;
            input_mut = input;

            let mut resolved = Vec::new();
            let mut unknown_iter = unknown.into_iter();
            for (folder, &num) in folders.iter().zip(counts.iter()) {
                if num == 1 && folder.unpack_crc.is_some() {
                    resolved.push(folder.unpack_crc);
                } else {
                    for _ in 0..num {
                        resolved.push(unknown_iter.next().flatten());
                    }
                }
            }
            crcs = Some(resolved);
        } else {
            let (input, _) = skip_property_data(input_mut)?;
            input_mut = input;
        }
    }

    let counts = effective_stream_counts(&nums, folders.len());

    let sizes = match sizes {
        Some(s) => s,
        None => {
            // Without a size block every folder must map to exactly one
            // substream covering its whole output.
            let mut derived = Vec::with_capacity(folders.len());
            for (folder, &num) in folders.iter().zip(counts.iter()) {
                match num {
                    0 => {}
                    1 => match folder.unpack_size() {
                        Ok(t) => derived.push(t),
                        Err(e) => return parse_failure(SevenZParserErrorKind::Folder(e)),
                    },
                    _ => return parse_failure(SevenZParserErrorKind::MissingSubStreamSizes),
                }
            }
            derived
        }
    };

    let crcs = match crcs {
        Some(c) => c,
        None => {
            let mut derived = Vec::new();
            for (folder, &num) in folders.iter().zip(counts.iter()) {
                if num == 1 {
                    derived.push(folder.unpack_crc);
                } else {
                    derived.extend(core::iter::repeat(None).take(num));
                }
            }
            derived
        }
    };

    return Ok((
        input_mut,
        SubStreamsInfo {
            num_unpack_streams: counts,
            sizes,
            crcs,
        },
    ));
}

/// A full streams-info block: pack info, folders and substream layout,
/// each section optional. The caller has consumed whichever property id
/// introduced the block.
pub fn streams_info(input: &[u8]) -> SevenZResult<StreamsInfo> {
    let mut pack: Option<PackInfo> = None;
    let mut folders: Vec<Folder> = Vec::new();
    let mut substreams: Option<SubStreamsInfo> = None;

    let mut input_mut = input;
    loop {
        let (input, id) = context("streams_info property id", u8)(input_mut)?;
        input_mut = input;

        if id == PropertyId::End as u8 {
            break;
        } else if id == PropertyId::PackInfo as u8 {
            let (input, read) = context("streams_info pack_info", pack_info)(input_mut)?;
            input_mut = input;
            pack = Some(read);
        } else if id == PropertyId::UnpackInfo as u8 {
            let (input, read) = context("streams_info unpack_info", unpack_info)(input_mut)?;
            input_mut = input;
            folders = read;
        } else if id == PropertyId::SubStreamsInfo as u8 {
            let (input, read) = context("streams_info substreams_info", |x| {
                substreams_info(x, &folders)
            })(input_mut)?;
            input_mut = input;
            substreams = Some(read);
        } else {
            return parse_failure(SevenZParserErrorKind::UnexpectedPropertyId(id));
        }
    }

    return Ok((
        input_mut,
        StreamsInfo {
            pack_info: pack,
            folders,
            substreams,
        },
    ));
}
