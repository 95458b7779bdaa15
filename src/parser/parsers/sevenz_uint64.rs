use super::SevenZResult;

use nom::error::context;
use nom::number::complete::u8;

/// 7zip stores many u64 values in a variable-length format: the number of
/// leading one bits in the first byte gives the number of following bytes,
/// which hold the value's low bytes little-endian; the remainder of the
/// first byte supplies the high bits. Parse that into a plain u64.
pub fn sevenz_uint64(input: &[u8]) -> SevenZResult<u64> {
    let (input, first) = context("packed u64 lead byte", u8)(input)?;
    let extra_bytes = first.leading_ones() as usize;

    let mut input_mut = input;
    let mut val: u64 = 0;
    for i in 0..extra_bytes {
        let (rest, byte) = context("packed u64 tail byte", u8)(input_mut)?;
        input_mut = rest;
        val |= (byte as u64) << (8 * i);
    }

    if extra_bytes < 8 {
        let mask = (1u64 << (8 - extra_bytes as u64)) - 1;
        val |= ((first as u64) & mask) << (8 * extra_bytes);
    }
    return Ok((input_mut, val));
}

/// Like [`sevenz_uint64`], but convert to usize and fail the parse if the
/// conversion is lossy.
pub fn sevenz_uint64_as_usize(input: &[u8]) -> SevenZResult<usize> {
    let (input, as_u64) = context("packed u64 as usize", sevenz_uint64)(input)?;
    let as_usize: usize = crate::to_usize_or_err!(as_u64);
    return Ok((input, as_usize));
}
