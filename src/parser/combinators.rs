//! Custom nom combinators for the 7z format.

use super::err::{SevenZParserError, SevenZResult};
use crate::parser::types::BoolVector;

use alloc::vec::Vec;

/// Runs the parser once per entry of `defined`, yielding `None` for the
/// entries whose bit is unset. Several header blocks (timestamps,
/// attributes, digests) store values only for the defined subset.
pub fn many_cond_opt<'a, 'b, O, F>(
    mut f: F,
    defined: &'b BoolVector,
) -> impl FnMut(&'a [u8]) -> SevenZResult<'a, Vec<Option<O>>> + 'b
where
    F: nom::Parser<&'a [u8], O, SevenZParserError> + 'b,
{
    move |input: &'a [u8]| {
        let mut out = Vec::with_capacity(defined.len());
        let mut input_mut = input;
        for bit in defined.iter() {
            if *bit {
                let (rest, val) = f.parse(input_mut)?;
                input_mut = rest;
                out.push(Some(val));
            } else {
                out.push(None);
            }
        }
        return Ok((input_mut, out));
    }
}
