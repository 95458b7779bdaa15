//! The high-level interface for reading archives.

mod err;
mod iter;
mod opts;
mod plan;

pub use err::*;
pub use iter::*;
pub use opts::*;
pub use plan::*;

use crate::archive::{ArchiveDatabase, FileEntry, Folder, FormatError};
use crate::codec::{BuiltinCodecs, CodecRegistry};
use crate::mix;
use crate::parser::crc::sevenz_crc;
use crate::parser::err::{SevenZParserError, SevenZParserErrorKind};
use crate::parser::interface::build_database;
use crate::parser::parsers;
use crate::parser::types::{Header, NextHeader, PropertyId, StreamsInfo, SIGNATURE_HEADER_LEN};

use alloc::string::String;
use alloc::vec::Vec;

/// Contents of one successfully extracted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub data: Vec<u8>,
    /// `Some(false)` flags a data-integrity problem; the bytes are still
    /// returned. `None` when the archive stored no CRC for this file or
    /// verification was turned off.
    pub crc_ok: Option<bool>,
}

/// Outcome of one file of an extraction batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub index: usize,
    pub result: Result<ExtractedFile, ExtractError>,
}

/// A parsed archive over a borrowed byte buffer.
///
/// Parsing happens once in [`open`](SevenZReader::open); afterwards the
/// reader is immutable, so entries can be listed and folders decoded from
/// multiple threads without locking.
#[derive(Debug, Clone)]
pub struct SevenZReader<'a> {
    data: &'a [u8],
    db: ArchiveDatabase,
    opts: OpenOptions,
}

fn slice_at<'a>(data: &'a [u8], offset: u64, len: u64, what: &'static str) -> Result<&'a [u8], Error> {
    let start = usize::try_from(offset).map_err(|_| Error::Truncated(what))?;
    let len = usize::try_from(len).map_err(|_| Error::Truncated(what))?;
    let end = start.checked_add(len).ok_or(Error::Truncated(what))?;
    return data.get(start..end).ok_or(Error::Truncated(what));
}

fn crc_failure(expected: u32, got: u32) -> Error {
    return Error::Header(SevenZParserError::new(SevenZParserErrorKind::Crc {
        expected,
        got,
    }));
}

fn check_folder_limits(folders: &[Folder], opts: &OpenOptions) -> Result<(), Error> {
    if folders.len() > opts.max_folders {
        return Err(Error::LimitExceeded("folder count"));
    }
    for folder in folders {
        if folder.coders.len() > opts.max_coders_per_folder {
            return Err(Error::LimitExceeded("coders per folder"));
        }
    }
    return Ok(());
}

impl<'a> SevenZReader<'a> {
    /// Open an archive with default options and only the built-in codecs.
    ///
    /// Archives whose header is itself compressed need the corresponding
    /// codec at open time — pass one via [`open_with`](SevenZReader::open_with).
    pub fn open(data: &'a [u8]) -> Result<SevenZReader<'a>, Error> {
        return Self::open_with(data, OpenOptions::default(), &BuiltinCodecs::default());
    }

    pub fn open_with(
        data: &'a [u8],
        opts: OpenOptions,
        registry: &dyn CodecRegistry,
    ) -> Result<SevenZReader<'a>, Error> {
        if data.len() < parsers::MAGIC.len() || data[..parsers::MAGIC.len()] != parsers::MAGIC {
            return Err(Error::NotSevenZ);
        }
        let (_, sig) = parsers::signature_header(data)?;
        let start = sig.start_header;

        if start.next_header_size == 0 {
            log::debug!("archive has an empty next header");
            return Ok(SevenZReader {
                data,
                db: ArchiveDatabase::default(),
                opts,
            });
        }

        let header_offset = (SIGNATURE_HEADER_LEN as u64)
            .checked_add(start.next_header_offset)
            .ok_or(Error::Truncated("next header out of bounds"))?;
        let header_bytes = slice_at(
            data,
            header_offset,
            start.next_header_size,
            "next header out of bounds",
        )?;

        let got = sevenz_crc(header_bytes);
        if got != start.next_header_crc {
            return Err(crc_failure(start.next_header_crc, got));
        }

        let header = resolve_header(data, header_bytes, registry, &opts, 2)?;
        let db = build_database(&header)?;
        if db.files.len() > opts.max_files {
            return Err(Error::LimitExceeded("file count"));
        }
        check_folder_limits(&db.folders, &opts)?;

        return Ok(SevenZReader { data, db, opts });
    }

    /// The parsed archive metadata.
    pub fn database(&self) -> &ArchiveDatabase {
        return &self.db;
    }

    pub fn entries(&self) -> Entries<'_> {
        return Entries::new(&self.db.files);
    }

    pub fn entry(&self, index: usize) -> Option<&FileEntry> {
        return self.db.files.get(index);
    }

    /// Index of the first entry with the given name.
    pub fn find_entry(&self, name: &str) -> Option<usize> {
        return self.db.files.iter().position(|f| f.name == name);
    }

    /// Extract the given entries, decoding each involved folder once.
    ///
    /// The batch tolerates per-folder failures: an unsupported method or a
    /// bad pack stream fails only the files of that folder. Results come
    /// back in ascending index order.
    pub fn extract_files(
        &self,
        indices: &[usize],
        registry: &dyn CodecRegistry,
    ) -> Result<Vec<FileResult>, Error> {
        for &index in indices {
            if index >= self.db.files.len() {
                return Err(Error::FileIndexOutOfRange(index));
            }
        }

        let mut results: Vec<FileResult> = Vec::new();
        for info in plan_extraction(&self.db, indices) {
            if let Some(index) = info.file_index {
                results.push(FileResult {
                    index,
                    result: Ok(ExtractedFile {
                        data: Vec::new(),
                        crc_ok: None,
                    }),
                });
                continue;
            }

            let folder_index = match info.folder_index {
                Some(f) => f,
                None => continue,
            };
            self.extract_folder(folder_index, &info, registry, &mut results)?;
        }

        results.sort_by_key(|r| r.index);
        return Ok(results);
    }

    /// Locate, decode and split one planned folder, appending per-file
    /// outcomes to `results`.
    fn extract_folder(
        &self,
        folder_index: usize,
        info: &ExtractFolderInfo,
        registry: &dyn CodecRegistry,
        results: &mut Vec<FileResult>,
    ) -> Result<(), Error> {
        let folder = &self.db.folders[folder_index];
        let folder_files = self.db.folder_files(folder_index);
        let wanted: Vec<usize> = folder_files
            .iter()
            .enumerate()
            .filter(|&(pos, _)| info.extract_statuses.get(pos).map(|b| *b).unwrap_or(false))
            .map(|(_, &file)| file)
            .collect();

        // Gather this folder's pack streams; a pack CRC failure poisons the
        // whole folder but not the batch.
        let first_pack = self.db.folder_first_pack_stream(folder_index);
        let mut packs: Vec<&[u8]> = Vec::with_capacity(folder.pack_streams.len());
        let mut folder_error: Option<ExtractError> = None;
        for k in 0..folder.pack_streams.len() {
            let global = first_pack + k;
            let offset = (SIGNATURE_HEADER_LEN as u64)
                .checked_add(self.db.pack_stream_offset(global))
                .ok_or(Error::Truncated("pack stream out of bounds"))?;
            let bytes = slice_at(
                self.data,
                offset,
                self.db.pack_sizes[global],
                "pack stream out of bounds",
            )?;
            if self.opts.verify_crc {
                if let Some(expected) = self.db.pack_crcs[global] {
                    if sevenz_crc(bytes) != expected {
                        log::warn!("pack stream {} failed its CRC check", global);
                        folder_error = Some(ExtractError::PackCrcMismatch { index: global });
                        break;
                    }
                }
            }
            packs.push(bytes);
        }

        let decoded = match folder_error {
            Some(e) => Err(e),
            None => mix::decode_folder(folder, &packs, registry).map_err(|e| {
                log::warn!("folder {} failed to decode: {}", folder_index, e);
                ExtractError::Codec(e)
            }),
        };

        let decoded = match decoded {
            Ok(bytes) => bytes,
            Err(e) => {
                for index in wanted {
                    results.push(FileResult {
                        index,
                        result: Err(e.clone()),
                    });
                }
                return Ok(());
            }
        };

        // Split the folder output at substream boundaries; the sizes were
        // validated against the folder's unpack size when the database was
        // built.
        let mut offset = 0usize;
        for (pos, &file_index) in folder_files.iter().enumerate() {
            let entry = &self.db.files[file_index];
            let size = entry.size as usize;
            let bytes = &decoded[offset..offset + size];
            offset += size;

            if !info.extract_statuses.get(pos).map(|b| *b).unwrap_or(false) {
                continue;
            }

            let crc_ok = match (self.opts.verify_crc, entry.crc) {
                (true, Some(expected)) => {
                    let ok = sevenz_crc(bytes) == expected;
                    if !ok {
                        log::warn!("file {} ({}) failed its CRC check", file_index, entry.name);
                    }
                    Some(ok)
                }
                _ => None,
            };
            results.push(FileResult {
                index: file_index,
                result: Ok(ExtractedFile {
                    data: Vec::from(bytes),
                    crc_ok,
                }),
            });
        }
        return Ok(());
    }

    /// Extract a single file by name.
    ///
    /// This is the convenience path: a CRC mismatch only logs a warning
    /// and the bytes are returned anyway; use
    /// [`extract_files`](SevenZReader::extract_files) to observe it.
    pub fn extract_by_name(
        &self,
        name: &str,
        registry: &dyn CodecRegistry,
    ) -> Result<Vec<u8>, Error> {
        let index = self
            .find_entry(name)
            .ok_or_else(|| Error::NoSuchFile(String::from(name)))?;
        let mut results = self.extract_files(&[index], registry)?;
        let result = match results.pop() {
            Some(r) => r,
            None => return Err(Error::NoSuchFile(String::from(name))),
        };
        match result.result {
            Ok(file) => return Ok(file.data),
            Err(e) => return Err(Error::Extract(e)),
        }
    }
}

/// Parse the next-header bytes, decoding through the registry as long as
/// they turn out to be a packed header. `depth` bounds the nesting.
fn resolve_header(
    data: &[u8],
    bytes: &[u8],
    registry: &dyn CodecRegistry,
    opts: &OpenOptions,
    depth: u8,
) -> Result<Header, Error> {
    let (_, parsed) = parsers::next_header(bytes)?;
    match parsed {
        NextHeader::Plain(header) => return Ok(header),
        NextHeader::Encoded(streams) => {
            if depth == 0 {
                return Err(Error::LimitExceeded("nested encoded headers"));
            }
            check_folder_limits(&streams.folders, opts)?;
            log::debug!("decoding packed header ({} folders)", streams.folders.len());
            let decoded = decode_packed_header(data, &streams, registry)?;
            return resolve_header(data, &decoded, registry, opts, depth - 1);
        }
    }
}

/// Decode the folders describing a packed header and concatenate their
/// outputs into the plain header bytes.
fn decode_packed_header(
    data: &[u8],
    streams: &StreamsInfo,
    registry: &dyn CodecRegistry,
) -> Result<Vec<u8>, Error> {
    let pack = streams.pack_info.as_ref().ok_or_else(|| {
        Error::Header(SevenZParserError::new(
            SevenZParserErrorKind::MissingProperty(PropertyId::PackInfo as u8),
        ))
    })?;

    let mut out = Vec::new();
    let mut stream_base = 0usize;
    for folder in &streams.folders {
        folder
            .validate()
            .map_err(|e| Error::Format(FormatError::Folder(e)))?;

        let mut packs: Vec<&[u8]> = Vec::with_capacity(folder.pack_streams.len());
        for k in 0..folder.pack_streams.len() {
            let global = stream_base + k;
            if global >= pack.sizes.len() {
                return Err(Error::Truncated("encoded header pack stream out of bounds"));
            }
            let before: u64 = pack.sizes[..global].iter().sum();
            let offset = (SIGNATURE_HEADER_LEN as u64)
                .checked_add(pack.pack_pos)
                .and_then(|o| o.checked_add(before))
                .ok_or(Error::Truncated("encoded header pack stream out of bounds"))?;
            packs.push(slice_at(
                data,
                offset,
                pack.sizes[global],
                "encoded header pack stream out of bounds",
            )?);
        }
        stream_base += folder.pack_streams.len();

        let decoded = mix::decode_folder(folder, &packs, registry).map_err(Error::HeaderDecode)?;
        if let Some(expected) = folder.unpack_crc {
            let got = sevenz_crc(&decoded);
            if got != expected {
                return Err(crc_failure(expected, got));
            }
        }
        out.extend_from_slice(&decoded);
    }
    return Ok(out);
}
