use super::{bool_byte, check_count, SevenZResult};
use crate::parser::combinators::many_cond_opt;
use crate::parser::types::BoolVector;

use alloc::vec::Vec;

use nom::bytes::complete::take;
use nom::error::context;
use nom::number::complete::le_u32;

/// Read `num_bits` flags packed most-significant-bit first, dropping the
/// padding bits of the final byte.
pub fn bool_vector(input: &[u8], num_bits: usize) -> SevenZResult<BoolVector> {
    let num_bytes = num_bits.div_ceil(8);
    let (input, raw) = context("bool vector bytes", take(num_bytes))(input)?;
    let mut bits = BoolVector::from_slice(raw);
    bits.truncate(num_bits);
    return Ok((input, bits));
}

/// Many per-item flag blocks start with an "all defined" shortcut byte;
/// the packed bits only follow when it is zero.
pub fn bool_vector_or_all_set(input: &[u8], num_bits: usize) -> SevenZResult<BoolVector> {
    let (input, all_set) = context("all-defined byte", bool_byte)(input)?;
    if all_set {
        return Ok((input, BoolVector::repeat(true, num_bits)));
    }
    return bool_vector(input, num_bits);
}

/// The shared digests layout: a defined-vector (with the all-set
/// shortcut), then one little-endian CRC-32 per defined entry.
pub fn digests(input: &[u8], count: usize) -> SevenZResult<Vec<Option<u32>>> {
    check_count(input, count)?;
    let (input, defined) = context("digests defined", |x| bool_vector_or_all_set(x, count))(input)?;
    let (input, crcs) = context("digests values", many_cond_opt(le_u32, &defined))(input)?;
    return Ok((input, crcs));
}
