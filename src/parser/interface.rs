//! Zip-up of the raw header pieces into the [`crate::archive`] model.

use super::types::{FileAttr, FileName, FileTime, FilesProperty, Header};
use crate::archive::{ArchiveDatabase, FileEntry, FormatError};
use crate::parser::types::BoolVector;

use alloc::vec::Vec;

use either::Either;

fn pick_time(times: Option<&Vec<Option<FileTime>>>, index: usize) -> Result<Option<u64>, FormatError> {
    match times.and_then(|v| v.get(index)).copied().flatten() {
        None => return Ok(None),
        Some(Either::Right(t)) => return Ok(Some(t)),
        Some(Either::Left(_)) => return Err(FormatError::ExternalDataUnsupported),
    }
}

fn pick_attr(attrs: Option<&Vec<Option<FileAttr>>>, index: usize) -> Result<Option<u32>, FormatError> {
    match attrs.and_then(|v| v.get(index)).copied().flatten() {
        None => return Ok(None),
        Some(Either::Right(a)) => return Ok(Some(a)),
        Some(Either::Left(_)) => return Err(FormatError::ExternalDataUnsupported),
    }
}

fn bit(bits: Option<&BoolVector>, index: usize) -> bool {
    return bits.and_then(|b| b.get(index)).map(|b| *b).unwrap_or(false);
}

/// Build the archive database from a parsed header, validating the
/// cross-structure invariants along the way.
pub fn build_database(header: &Header) -> Result<ArchiveDatabase, FormatError> {
    let mut db = ArchiveDatabase::default();

    if let Some(props) = &header.archive_properties {
        log::debug!(
            "ignoring {} vendor archive properties",
            props.property_data.len()
        );
    }
    if header.additional_streams.is_some() {
        // Additional streams hold externally stored metadata; anything that
        // actually references them is rejected below.
        log::debug!("archive carries additional streams info");
    }

    // Per-substream layout in global substream order.
    let mut sub_sizes: Vec<u64> = Vec::new();
    let mut sub_crcs: Vec<Option<u32>> = Vec::new();

    if let Some(streams) = &header.main_streams {
        if let Some(pack) = &streams.pack_info {
            db.pack_pos = pack.pack_pos;
            db.pack_sizes = pack.sizes.clone();
            db.pack_crcs = pack.crcs.clone();
        }
        db.folders = streams.folders.clone();
        match &streams.substreams {
            Some(sub) => {
                db.num_unpack_streams = sub.num_unpack_streams.clone();
                sub_sizes = sub.sizes.clone();
                sub_crcs = sub.crcs.clone();
            }
            None => {
                // One substream per folder, covering its whole output.
                for folder in &db.folders {
                    db.num_unpack_streams.push(1);
                    sub_sizes.push(folder.unpack_size()?);
                    sub_crcs.push(folder.unpack_crc);
                }
            }
        }
    }

    match &header.files {
        None => {
            if !sub_sizes.is_empty() {
                return Err(FormatError::SubStreamCountMismatch {
                    expected: sub_sizes.len(),
                    got: 0,
                });
            }
        }
        Some(fi) => {
            let mut empty_stream: Option<&BoolVector> = None;
            let mut empty_file: Option<&BoolVector> = None;
            let mut anti: Option<&BoolVector> = None;
            let mut names: Option<&Vec<FileName>> = None;
            let mut ctimes: Option<&Vec<Option<FileTime>>> = None;
            let mut atimes: Option<&Vec<Option<FileTime>>> = None;
            let mut mtimes: Option<&Vec<Option<FileTime>>> = None;
            let mut attrs: Option<&Vec<Option<FileAttr>>> = None;

            for prop in &fi.properties {
                match prop {
                    FilesProperty::EmptyStream(b) => empty_stream = Some(b),
                    FilesProperty::EmptyFile(b) => empty_file = Some(b),
                    FilesProperty::Anti(b) => anti = Some(b),
                    FilesProperty::Names(n) => names = Some(n),
                    FilesProperty::CTime(t) => ctimes = Some(t),
                    FilesProperty::ATime(t) => atimes = Some(t),
                    FilesProperty::MTime(t) => mtimes = Some(t),
                    FilesProperty::Attributes(a) => attrs = Some(a),
                }
            }

            let names = names.ok_or(FormatError::MissingNames)?;
            if names.len() != fi.num_files {
                return Err(FormatError::FilePropertyCountMismatch {
                    expected: fi.num_files,
                    got: names.len(),
                });
            }

            let mut sub_cursor = 0usize;
            let mut empty_cursor = 0usize;
            for i in 0..fi.num_files {
                let name = match &names[i] {
                    Either::Right(s) => s.clone(),
                    Either::Left(_) => return Err(FormatError::ExternalDataUnsupported),
                };

                let is_empty_stream = bit(empty_stream, i);
                let mut entry = FileEntry {
                    name,
                    has_stream: !is_empty_stream,
                    ctime: pick_time(ctimes, i)?,
                    atime: pick_time(atimes, i)?,
                    mtime: pick_time(mtimes, i)?,
                    attributes: pick_attr(attrs, i)?,
                    ..FileEntry::default()
                };

                if is_empty_stream {
                    entry.is_empty_file = bit(empty_file, empty_cursor);
                    entry.is_anti = bit(anti, empty_cursor);
                    entry.is_directory = !entry.is_empty_file && !entry.is_anti;
                    empty_cursor += 1;
                } else {
                    if sub_cursor >= sub_sizes.len() {
                        return Err(FormatError::SubStreamCountMismatch {
                            expected: sub_sizes.len(),
                            got: sub_cursor + 1,
                        });
                    }
                    entry.size = sub_sizes[sub_cursor];
                    entry.crc = sub_crcs.get(sub_cursor).copied().flatten();
                    sub_cursor += 1;
                }
                db.files.push(entry);
            }

            if sub_cursor != sub_sizes.len() {
                return Err(FormatError::SubStreamCountMismatch {
                    expected: sub_sizes.len(),
                    got: sub_cursor,
                });
            }
        }
    }

    db.build_indexes()?;
    return Ok(db);
}
