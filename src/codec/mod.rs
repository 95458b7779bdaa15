//! Pluggable decoders for the stream methods documented in 7zip's
//! methods.txt.
//!
//! The archive core never decompresses bytes itself: it resolves which
//! method applies to which stream and hands the work to a [`Codec`] looked
//! up by method id in a caller-supplied [`CodecRegistry`]. Only the trivial
//! `Copy` method is built in; real codecs (LZMA, delta, BCJ…) plug in from
//! outside.

mod copy;
pub use copy::*;

use alloc::vec::Vec;

use thiserror::Error;

/// Well-known method ids, for registry implementations.
pub mod method_id {
    pub const COPY: &[u8] = &[0x00];
    pub const DELTA: &[u8] = &[0x03];
    pub const LZMA2: &[u8] = &[0x21];
    pub const LZMA: &[u8] = &[0x03, 0x01, 0x01];
    pub const BCJ_X86: &[u8] = &[0x03, 0x03, 0x01, 0x03];
    pub const BCJ2: &[u8] = &[0x03, 0x03, 0x01, 0x1B];
    pub const BZIP2: &[u8] = &[0x04, 0x02, 0x02];
}

/// Errors raised while driving a folder's coder chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// No registered codec handles the method id. Fatal for the files of
    /// the affected folder only.
    #[error("no codec registered for method id {0:02x?}")]
    UnsupportedMethod(Vec<u8>),
    /// A coder produced a stream of the wrong length.
    #[error("coder output size mismatch: header declares {declared}, coder produced {produced}")]
    OutputSizeMismatch { declared: u64, produced: u64 },
    /// A codec was handed the wrong number of input streams for its method.
    #[error("codec {name} expects {expected} input streams, got {got}")]
    InputArityMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    /// The folder's bind graph cannot be executed.
    #[error("malformed coder graph: {0}")]
    Graph(&'static str),
    /// Method-specific decode failure.
    #[error("codec {name} failed: {reason}")]
    Failed {
        name: &'static str,
        reason: &'static str,
    },
}

/// One decoding stage.
///
/// Implementations receive every input stream of the coder at once and
/// must produce every output stream, each exactly as long as its declared
/// unpacked size.
pub trait Codec {
    fn name(&self) -> &'static str;

    fn decode(&self, inputs: &[&[u8]], output_sizes: &[u64]) -> Result<Vec<Vec<u8>>, CodecError>;
}

/// Resolves a method id to a decoder.
pub trait CodecRegistry {
    fn find(&self, method_id: &[u8]) -> Option<&dyn Codec>;
}

/// The registry of codecs shipped with this crate: `Copy` only.
#[derive(Debug, Clone, Default)]
pub struct BuiltinCodecs {
    copy: CopyCodec,
}

impl CodecRegistry for BuiltinCodecs {
    fn find(&self, method_id: &[u8]) -> Option<&dyn Codec> {
        if method_id == method_id::COPY {
            return Some(&self.copy);
        }
        return None;
    }
}
