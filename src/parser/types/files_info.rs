use super::BoolVector;

use alloc::string::String;
use alloc::vec::Vec;

use either::Either;

/// Left: external data index, right: time.
pub type FileTime = Either<u64, u64>;

/// Left: external data index, right: name.
pub type FileName = Either<u64, String>;

/// Left: external data index, right: attributes.
pub type FileAttr = Either<u64, u32>;

/// One decoded property block of the files info.
///
/// `EmptyFile` and `Anti` carry one bit per *empty stream*, not per file;
/// everything else is per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilesProperty {
    EmptyStream(BoolVector),
    EmptyFile(BoolVector),
    Anti(BoolVector),
    CTime(Vec<Option<FileTime>>),
    ATime(Vec<Option<FileTime>>),
    MTime(Vec<Option<FileTime>>),
    Names(Vec<FileName>),
    Attributes(Vec<Option<FileAttr>>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilesInfo {
    pub num_files: usize,
    pub properties: Vec<FilesProperty>,
}
