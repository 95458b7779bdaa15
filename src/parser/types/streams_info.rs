use crate::archive::Folder;

use alloc::vec::Vec;

/// Location and integrity data of the raw pack streams.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackInfo {
    /// Offset of the first pack stream, relative to the end of the
    /// signature header.
    pub pack_pos: u64,
    pub sizes: Vec<u64>,
    /// One entry per pack stream; `None` where the header stored no digest.
    pub crcs: Vec<Option<u32>>,
}

/// Fully resolved per-substream layout.
///
/// The wire format stores this with several shortcuts (implied counts,
/// derived last sizes, digests only where the folder digest is unknown);
/// the parser undoes all of them, so these vectors are always complete and
/// aligned: one entry per substream, in folder order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubStreamsInfo {
    /// Number of substreams (files) carried by each folder.
    pub num_unpack_streams: Vec<usize>,
    pub sizes: Vec<u64>,
    pub crcs: Vec<Option<u32>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamsInfo {
    pub pack_info: Option<PackInfo>,
    pub folders: Vec<Folder>,
    pub substreams: Option<SubStreamsInfo>,
}
