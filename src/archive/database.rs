use super::{Folder, FolderError};

use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

/// Cross-structure inconsistencies found while assembling the database.
///
/// Like [`FolderError`], any of these makes the archive unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error(transparent)]
    Folder(#[from] FolderError),
    #[error("folders consume {used} pack streams but the archive stores {declared}")]
    PackStreamTotalMismatch { declared: usize, used: usize },
    #[error("folders carry {expected} substreams but {got} file entries have streams")]
    SubStreamCountMismatch { expected: usize, got: usize },
    #[error("substream sizes of folder {folder} do not sum to its unpack size")]
    SubStreamSizesMismatch { folder: usize },
    #[error("files-info property covers {got} entries, expected {expected}")]
    FilePropertyCountMismatch { expected: usize, got: usize },
    #[error("archive stores no file names")]
    MissingNames,
    #[error("externally stored header data is not supported")]
    ExternalDataUnsupported,
}

/// Metadata of one entry, in archive order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileEntry {
    pub name: String,
    /// Whether any decoded bytes back this entry. Directories, empty files
    /// and anti-files carry none.
    pub has_stream: bool,
    pub is_directory: bool,
    pub is_empty_file: bool,
    /// Deletion marker used by incremental backup archives.
    pub is_anti: bool,
    pub size: u64,
    pub crc: Option<u32>,
    pub ctime: Option<u64>,
    pub atime: Option<u64>,
    pub mtime: Option<u64>,
    pub attributes: Option<u32>,
}

/// The complete parsed representation of one archive.
///
/// Populated once when the archive is opened; to pick up changes in the
/// underlying bytes, [`clear`](ArchiveDatabase::clear) it and parse again
/// (or simply parse into a fresh value — the two are equal by value).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveDatabase {
    /// Offset of the first pack stream, relative to the end of the
    /// signature header.
    pub pack_pos: u64,
    /// Compressed size of each raw pack stream.
    pub pack_sizes: Vec<u64>,
    /// Optional integrity check per pack stream.
    pub pack_crcs: Vec<Option<u32>>,
    pub folders: Vec<Folder>,
    /// How many file entries each folder carries. A folder holds more than
    /// one when several files share its solid block.
    pub num_unpack_streams: Vec<usize>,
    pub files: Vec<FileEntry>,

    // Derived maps, filled by `build_indexes`.
    pub(crate) folder_start_pack_stream: Vec<usize>,
    pub(crate) file_to_folder: Vec<Option<usize>>,
    pub(crate) folder_start_file: Vec<usize>,
}

impl ArchiveDatabase {
    /// Drop all contents, keeping allocations for a re-parse.
    pub fn clear(&mut self) {
        self.pack_pos = 0;
        self.pack_sizes.clear();
        self.pack_crcs.clear();
        self.folders.clear();
        self.num_unpack_streams.clear();
        self.files.clear();
        self.folder_start_pack_stream.clear();
        self.file_to_folder.clear();
        self.folder_start_file.clear();
    }

    /// Validate the cross-structure invariants and compute the derived
    /// index maps. Must be called once after the raw fields are filled.
    pub fn build_indexes(&mut self) -> Result<(), FormatError> {
        if self.num_unpack_streams.len() != self.folders.len() {
            return Err(FormatError::SubStreamCountMismatch {
                expected: self.folders.len(),
                got: self.num_unpack_streams.len(),
            });
        }
        for folder in &self.folders {
            folder.validate()?;
        }

        let used: usize = self.folders.iter().map(|f| f.pack_streams.len()).sum();
        if used != self.pack_sizes.len() {
            return Err(FormatError::PackStreamTotalMismatch {
                declared: self.pack_sizes.len(),
                used,
            });
        }

        let streamed = self.files.iter().filter(|f| f.has_stream).count();
        let expected: usize = self.num_unpack_streams.iter().sum();
        if expected != streamed {
            return Err(FormatError::SubStreamCountMismatch {
                expected,
                got: streamed,
            });
        }

        self.folder_start_pack_stream.clear();
        let mut acc = 0;
        for folder in &self.folders {
            self.folder_start_pack_stream.push(acc);
            acc += folder.pack_streams.len();
        }

        // Walk files and folders in lockstep: folder `i` owns the next
        // `num_unpack_streams[i]` streamed entries.
        self.file_to_folder.clear();
        self.folder_start_file.clear();
        let mut folder = 0usize;
        let mut left_in_folder = 0usize;
        for (idx, file) in self.files.iter().enumerate() {
            if !file.has_stream {
                self.file_to_folder.push(None);
                continue;
            }
            while left_in_folder == 0 {
                // Skip folders that carry no files.
                self.folder_start_file.push(idx);
                left_in_folder = self.num_unpack_streams[folder];
                if left_in_folder == 0 {
                    folder += 1;
                }
            }
            self.file_to_folder.push(Some(folder));
            left_in_folder -= 1;
            if left_in_folder == 0 {
                folder += 1;
            }
        }
        while self.folder_start_file.len() < self.folders.len() {
            self.folder_start_file.push(self.files.len());
        }

        // Per-folder substream sizes must add up to the folder's output.
        for (i, f) in self.folders.iter().enumerate() {
            let sum: u64 = self.substream_sizes(i).iter().sum();
            if sum != f.unpack_size()? {
                return Err(FormatError::SubStreamSizesMismatch { folder: i });
            }
        }

        log::debug!(
            "archive database ready: {} pack streams, {} folders, {} files",
            self.pack_sizes.len(),
            self.folders.len(),
            self.files.len()
        );
        return Ok(());
    }

    /// Byte offset of the given pack stream, relative to the end of the
    /// signature header.
    pub fn pack_stream_offset(&self, index: usize) -> u64 {
        let before: u64 = self.pack_sizes[..index].iter().sum();
        return self.pack_pos + before;
    }

    /// Global index of the first pack stream consumed by the given folder.
    pub fn folder_first_pack_stream(&self, folder: usize) -> usize {
        return self.folder_start_pack_stream[folder];
    }

    /// The folder owning the given file, or `None` for stream-less entries.
    pub fn folder_for_file(&self, file: usize) -> Option<usize> {
        return self.file_to_folder.get(file).copied().flatten();
    }

    /// Unpacked size of each file carried by the given folder, in order.
    /// A folder's decoded output splits at exactly these boundaries.
    pub fn substream_sizes(&self, folder: usize) -> Vec<u64> {
        return self
            .folder_files(folder)
            .iter()
            .map(|&file| self.files[file].size)
            .collect();
    }

    /// Indices of the streamed file entries carried by the given folder,
    /// in archive order.
    pub fn folder_files(&self, folder: usize) -> Vec<usize> {
        let start = self.folder_start_file[folder];
        let want = self.num_unpack_streams[folder];
        let mut out = Vec::with_capacity(want);
        for idx in start..self.files.len() {
            if out.len() == want {
                break;
            }
            if self.file_to_folder[idx] == Some(folder) {
                out.push(idx);
            }
        }
        return out;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::archive::CoderInfo;
    use alloc::string::ToString;
    use alloc::vec;

    fn entry(name: &str, size: u64, has_stream: bool) -> FileEntry {
        return FileEntry {
            name: name.to_string(),
            has_stream,
            is_directory: !has_stream,
            size,
            ..FileEntry::default()
        };
    }

    fn db_two_folders() -> ArchiveDatabase {
        let folder_a = Folder {
            coders: vec![CoderInfo::simple(vec![0x00], None)],
            pack_streams: vec![0],
            unpack_sizes: vec![10],
            ..Folder::default()
        };
        let folder_b = Folder {
            coders: vec![CoderInfo::simple(vec![0x00], None)],
            pack_streams: vec![0],
            unpack_sizes: vec![7],
            ..Folder::default()
        };
        return ArchiveDatabase {
            pack_pos: 0,
            pack_sizes: vec![10, 7],
            pack_crcs: vec![None, None],
            folders: vec![folder_a, folder_b],
            num_unpack_streams: vec![2, 1],
            files: vec![
                entry("a.txt", 4, true),
                entry("dir", 0, false),
                entry("b.txt", 6, true),
                entry("c.txt", 7, true),
            ],
            ..ArchiveDatabase::default()
        };
    }

    #[test]
    fn substream_sum_matches_streamed_files() {
        let mut db = db_two_folders();
        db.build_indexes().unwrap();
        let streamed = db.files.iter().filter(|f| f.has_stream).count();
        let total: usize = db.num_unpack_streams.iter().sum();
        assert_eq!(total, streamed);
    }

    #[test]
    fn files_map_to_owning_folders_in_order() {
        let mut db = db_two_folders();
        db.build_indexes().unwrap();
        assert_eq!(db.folder_for_file(0), Some(0));
        assert_eq!(db.folder_for_file(1), None);
        assert_eq!(db.folder_for_file(2), Some(0));
        assert_eq!(db.folder_for_file(3), Some(1));
        assert_eq!(db.folder_files(0), vec![0, 2]);
        assert_eq!(db.folder_files(1), vec![3]);
    }

    #[test]
    fn pack_stream_offsets_accumulate() {
        let mut db = db_two_folders();
        db.build_indexes().unwrap();
        assert_eq!(db.pack_stream_offset(0), 0);
        assert_eq!(db.pack_stream_offset(1), 10);
        assert_eq!(db.folder_first_pack_stream(1), 1);
    }

    #[test]
    fn substream_count_mismatch_is_rejected() {
        let mut db = db_two_folders();
        db.num_unpack_streams = vec![1, 1];
        assert_eq!(
            db.build_indexes(),
            Err(FormatError::SubStreamCountMismatch {
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn substream_size_mismatch_is_rejected() {
        let mut db = db_two_folders();
        db.files[0].size = 5;
        assert_eq!(
            db.build_indexes(),
            Err(FormatError::SubStreamSizesMismatch { folder: 0 })
        );
    }

    #[test]
    fn clear_resets_everything() {
        let mut db = db_two_folders();
        db.build_indexes().unwrap();
        db.clear();
        assert_eq!(db, ArchiveDatabase::default());
    }
}
