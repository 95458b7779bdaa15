use super::*;
use crate::parser::combinators::many_cond_opt;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use either::{Left, Right};
use nom::multi::many_till;
use nom::number::complete::le_u16;
use widestring::U16Str;

/// A file name: UTF-16LE code units up to a two-byte NUL.
fn wchar_str(input: &[u8]) -> SevenZResult<String> {
    let (input, (units, _)) =
        context("file name utf16 units", many_till(le_u16, tag([0u8, 0u8])))(input)?;
    match U16Str::from_slice(&units).to_string() {
        Ok(s) => return Ok((input, s)),
        Err(_) => return parse_failure(SevenZParserErrorKind::NameNotUtf16),
    }
}

/// The name block: an external flag, then one name per file.
fn names(input: &[u8], num_files: usize) -> SevenZResult<Vec<FileName>> {
    let (input, external) = context("names external flag", bool_byte)(input)?;
    if external {
        let (input, data_index) = context("names data index", sevenz_uint64)(input)?;
        return Ok((input, vec![Left(data_index); num_files]));
    }

    let mut out = Vec::with_capacity(num_files.min(input.len()));
    let mut input_mut = input;
    for _ in 0..num_files {
        let (input, name) = wchar_str(input_mut)?;
        input_mut = input;
        out.push(Right(name));
    }
    if !input_mut.is_empty() {
        return parse_failure(SevenZParserErrorKind::NamesMismatch);
    }
    return Ok((input_mut, out));
}

/// A timestamp block: defined-vector, external flag, then one 64-bit
/// filetime per defined entry.
fn times(input: &[u8], num_files: usize) -> SevenZResult<Vec<Option<FileTime>>> {
    let (input, defined) = context("times defined", |x| bool_vector_or_all_set(x, num_files))(input)?;
    let (input, external) = context("times external flag", bool_byte)(input)?;
    if external {
        let (input, data_index) = context("times data index", sevenz_uint64)(input)?;
        let all = defined
            .iter()
            .map(|bit| if *bit { Some(Left(data_index)) } else { None })
            .collect();
        return Ok((input, all));
    }

    let (input, raw) = context("times values", many_cond_opt(le_u64, &defined))(input)?;
    let resolved = raw.into_iter().map(|t| t.map(Right)).collect();
    return Ok((input, resolved));
}

/// The attributes block, laid out like the timestamp blocks but with
/// 32-bit values.
fn attrs(input: &[u8], num_files: usize) -> SevenZResult<Vec<Option<FileAttr>>> {
    let (input, defined) = context("attrs defined", |x| bool_vector_or_all_set(x, num_files))(input)?;
    let (input, external) = context("attrs external flag", bool_byte)(input)?;
    if external {
        let (input, data_index) = context("attrs data index", sevenz_uint64)(input)?;
        let all = defined
            .iter()
            .map(|bit| if *bit { Some(Left(data_index)) } else { None })
            .collect();
        return Ok((input, all));
    }

    let (input, raw) = context("attrs values", many_cond_opt(le_u32, &defined))(input)?;
    let resolved = raw.into_iter().map(|a| a.map(Right)).collect();
    return Ok((input, resolved));
}

/// Padding inserted by some writers for alignment; must be all zero.
fn dummy(data: &[u8]) -> Result<(), nom::Err<SevenZParserError>> {
    if data.iter().any(|&b| b != 0) {
        return parse_failure(SevenZParserErrorKind::DummyNotAllZeroes);
    }
    return Ok(());
}

/// The files-info section: a file count followed by size-prefixed property
/// blocks. Unknown optional properties are skipped; their size field makes
/// that safe. The caller has consumed the section's property id.
pub fn files_info(input: &[u8]) -> SevenZResult<FilesInfo> {
    let (input, num_files) = context("files_info file count", sevenz_uint64_as_usize)(input)?;
    check_count(input, num_files)?;

    let mut properties: Vec<FilesProperty> = Vec::new();
    let mut num_empty_streams = 0usize;

    let mut input_mut = input;
    loop {
        let (input, id) = context("files_info property id", u8)(input_mut)?;
        input_mut = input;
        if id == PropertyId::End as u8 {
            break;
        }

        let (input, size) = context("files_info property size", sevenz_uint64_as_usize)(input_mut)?;
        let (input, data) = context("files_info property data", take(size))(input)?;
        input_mut = input;

        match PropertyId::try_from(id) {
            Ok(PropertyId::EmptyStream) => {
                let (_, bits) = bool_vector(data, num_files)?;
                num_empty_streams = bits.count_ones();
                properties.push(FilesProperty::EmptyStream(bits));
            }
            Ok(PropertyId::EmptyFile) => {
                let (_, bits) = bool_vector(data, num_empty_streams)?;
                properties.push(FilesProperty::EmptyFile(bits));
            }
            Ok(PropertyId::Anti) => {
                let (_, bits) = bool_vector(data, num_empty_streams)?;
                properties.push(FilesProperty::Anti(bits));
            }
            Ok(PropertyId::Name) => {
                let (_, read) = names(data, num_files)?;
                properties.push(FilesProperty::Names(read));
            }
            Ok(PropertyId::CTime) => {
                let (_, read) = times(data, num_files)?;
                properties.push(FilesProperty::CTime(read));
            }
            Ok(PropertyId::ATime) => {
                let (_, read) = times(data, num_files)?;
                properties.push(FilesProperty::ATime(read));
            }
            Ok(PropertyId::MTime) => {
                let (_, read) = times(data, num_files)?;
                properties.push(FilesProperty::MTime(read));
            }
            Ok(PropertyId::WinAttributes) => {
                let (_, read) = attrs(data, num_files)?;
                properties.push(FilesProperty::Attributes(read));
            }
            Ok(PropertyId::Dummy) => dummy(data)?,
            _ => {
                log::debug!("skipping files-info property 0x{:02x} ({} bytes)", id, size);
            }
        }
    }

    return Ok((
        input_mut,
        FilesInfo {
            num_files,
            properties,
        },
    ));
}
