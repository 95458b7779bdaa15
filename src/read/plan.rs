use crate::archive::ArchiveDatabase;

use alloc::vec::Vec;

use bitvec::vec::BitVec;

/// Transient per-request state for one folder (or one stream-less entry)
/// touched by an extraction batch. Built by [`plan_extraction`], consumed
/// by the extraction driver, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractFolderInfo {
    /// Set for stream-less entries, which need no folder decode at all.
    pub file_index: Option<usize>,
    pub folder_index: Option<usize>,
    /// One bit per leading file of the folder, up to the last wanted one:
    /// `true` to surface the file, `false` to decode and discard it
    /// (solid blocks can only be decoded front to back).
    pub extract_statuses: BitVec,
    /// Total unpacked bytes of the files marked for extraction.
    pub unpack_size: u64,
}

impl ExtractFolderInfo {
    fn for_file(file_index: usize) -> ExtractFolderInfo {
        return ExtractFolderInfo {
            file_index: Some(file_index),
            folder_index: None,
            extract_statuses: BitVec::new(),
            unpack_size: 0,
        };
    }

    fn for_folder(folder_index: usize) -> ExtractFolderInfo {
        return ExtractFolderInfo {
            file_index: None,
            folder_index: Some(folder_index),
            extract_statuses: BitVec::new(),
            unpack_size: 0,
        };
    }

    fn mark(&mut self, position_in_folder: usize, size: u64) {
        while self.extract_statuses.len() <= position_in_folder {
            self.extract_statuses.push(false);
        }
        self.extract_statuses.set(position_in_folder, true);
        self.unpack_size += size;
    }
}

/// Group the requested file indices by owning folder.
///
/// Indices may arrive unsorted or duplicated; the plan is in ascending
/// index order with one entry per distinct folder. Files sharing a folder
/// with a wanted file but not wanted themselves come out marked `false`.
///
/// Callers must have validated the indices against the file count.
pub fn plan_extraction(db: &ArchiveDatabase, indices: &[usize]) -> Vec<ExtractFolderInfo> {
    let mut sorted = Vec::from(indices);
    sorted.sort_unstable();
    sorted.dedup();

    let mut plan: Vec<ExtractFolderInfo> = Vec::new();
    for index in sorted {
        let folder = match db.folder_for_file(index) {
            None => {
                plan.push(ExtractFolderInfo::for_file(index));
                continue;
            }
            Some(f) => f,
        };

        let position = db
            .folder_files(folder)
            .iter()
            .position(|&f| f == index)
            .unwrap_or(0);
        let size = db.files[index].size;

        let same_folder = matches!(plan.last(), Some(info) if info.folder_index == Some(folder));
        if !same_folder {
            plan.push(ExtractFolderInfo::for_folder(folder));
        }
        if let Some(info) = plan.last_mut() {
            info.mark(position, size);
        }
    }
    return plan;
}
