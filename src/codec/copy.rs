use super::{Codec, CodecError};

use alloc::vec;
use alloc::vec::Vec;

/// The trivial codec: bytes pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyCodec;

impl Codec for CopyCodec {
    fn name(&self) -> &'static str {
        return "copy";
    }

    fn decode(&self, inputs: &[&[u8]], output_sizes: &[u64]) -> Result<Vec<Vec<u8>>, CodecError> {
        if inputs.len() != 1 || output_sizes.len() != 1 {
            return Err(CodecError::InputArityMismatch {
                name: self.name(),
                expected: 1,
                got: inputs.len(),
            });
        }
        if inputs[0].len() as u64 != output_sizes[0] {
            return Err(CodecError::OutputSizeMismatch {
                declared: output_sizes[0],
                produced: inputs[0].len() as u64,
            });
        }
        return Ok(vec![Vec::from(inputs[0])]);
    }
}
