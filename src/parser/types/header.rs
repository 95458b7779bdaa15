use super::{ArchiveProperties, FilesInfo, StreamsInfo};

/// Total bytes of the fixed-size signature header at the start of every
/// archive: 6 magic bytes, 2 version bytes, the start-header CRC and the
/// start header itself.
pub const SIGNATURE_HEADER_LEN: usize = 6 + 2 + 4 + START_HEADER_LEN;

/// The CRC-protected tail of the signature header.
pub const START_HEADER_LEN: usize = 8 + 8 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveVersion {
    pub major: u8,
    pub minor: u8,
}

/// Locates the "next header" (the real metadata) within the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartHeader {
    /// Offset of the next header, relative to the end of the signature
    /// header.
    pub next_header_offset: u64,
    pub next_header_size: u64,
    pub next_header_crc: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeader {
    pub archive_version: ArchiveVersion,
    pub start_header_crc: u32,
    pub start_header: StartHeader,
}

/// The decoded next header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub archive_properties: Option<ArchiveProperties>,
    pub additional_streams: Option<StreamsInfo>,
    pub main_streams: Option<StreamsInfo>,
    pub files: Option<FilesInfo>,
}

/// What the next-header bytes turned out to contain: either the metadata
/// itself, or the streams info of a compressed copy of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextHeader {
    Plain(Header),
    Encoded(StreamsInfo),
}
