//! Helpers for building well-formed archives byte by byte.

/// CRC-32 as the 7z container uses it (reflected, same as zip/gzip).
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

/// The variable-length integer encoding used throughout the header.
pub fn packed(v: u64) -> Vec<u8> {
    let mut extra = 0usize;
    while extra < 8 && (v >> (7 * (extra as u32 + 1))) != 0 {
        extra += 1;
    }
    let mut out = Vec::with_capacity(1 + extra);
    if extra == 8 {
        out.push(0xFF);
        out.extend_from_slice(&v.to_le_bytes());
    } else {
        let ones = if extra == 0 { 0 } else { 0xFFu8 << (8 - extra) };
        out.push(ones | (v >> (8 * extra)) as u8);
        out.extend_from_slice(&v.to_le_bytes()[..extra]);
    }
    out
}

fn utf16z(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(&[0, 0]);
    out
}

/// One solid block of the synthetic archive: a single coder applied to the
/// concatenation of the listed files.
pub struct FolderSpec {
    pub method: Vec<u8>,
    pub files: Vec<(&'static str, Vec<u8>)>,
}

impl FolderSpec {
    pub fn stored(files: Vec<(&'static str, Vec<u8>)>) -> FolderSpec {
        FolderSpec {
            method: vec![0x00],
            files,
        }
    }

    fn pack_data(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (_, data) in &self.files {
            out.extend_from_slice(data);
        }
        out
    }
}

pub struct BuildOpts {
    pub pack_crcs: bool,
    pub folder_crcs: bool,
    pub file_crcs: bool,
    pub dirs: Vec<&'static str>,
    pub encoded_header: bool,
}

impl Default for BuildOpts {
    fn default() -> Self {
        BuildOpts {
            pack_crcs: false,
            folder_crcs: true,
            file_crcs: true,
            dirs: Vec::new(),
            encoded_header: false,
        }
    }
}

fn build_header(folders: &[FolderSpec], opts: &BuildOpts) -> Vec<u8> {
    let pack_data: Vec<Vec<u8>> = folders.iter().map(|f| f.pack_data()).collect();

    let mut h = vec![0x01]; // kHeader
    h.push(0x04); // kMainStreamsInfo

    // Pack info.
    h.push(0x06);
    h.extend(packed(0)); // pack_pos
    h.extend(packed(folders.len() as u64));
    h.push(0x09); // kSize
    for data in &pack_data {
        h.extend(packed(data.len() as u64));
    }
    if opts.pack_crcs {
        h.push(0x0A);
        h.push(0x01); // all defined
        for data in &pack_data {
            h.extend_from_slice(&crc32(data).to_le_bytes());
        }
    }
    h.push(0x00);

    // Unpack info.
    h.push(0x07);
    h.push(0x0B); // kFolder
    h.extend(packed(folders.len() as u64));
    h.push(0x00); // not external
    for folder in folders {
        h.extend(packed(1)); // one coder
        h.push(folder.method.len() as u8); // flags: id length only
        h.extend_from_slice(&folder.method);
    }
    h.push(0x0C); // kCodersUnpackSize
    for data in &pack_data {
        h.extend(packed(data.len() as u64));
    }
    if opts.folder_crcs {
        h.push(0x0A);
        h.push(0x01);
        for data in &pack_data {
            h.extend_from_slice(&crc32(data).to_le_bytes());
        }
    }
    h.push(0x00);

    // Substreams info, only when the defaults would not describe the
    // layout.
    let multi = folders.iter().any(|f| f.files.len() != 1);
    let crcs_via_substreams = opts.file_crcs && !opts.folder_crcs;
    if multi || crcs_via_substreams {
        h.push(0x08);
        if multi {
            h.push(0x0D); // kNumUnpackStream
            for folder in folders {
                h.extend(packed(folder.files.len() as u64));
            }
            h.push(0x09); // kSize: all but the last file of each folder
            for folder in folders {
                for (_, data) in &folder.files[..folder.files.len() - 1] {
                    h.extend(packed(data.len() as u64));
                }
            }
        }
        if opts.file_crcs {
            h.push(0x0A);
            h.push(0x01);
            for folder in folders {
                if folder.files.len() == 1 && opts.folder_crcs {
                    continue; // digest already known from the folder
                }
                for (_, data) in &folder.files {
                    h.extend_from_slice(&crc32(data).to_le_bytes());
                }
            }
        }
        h.push(0x00);
    }

    h.push(0x00); // end of streams info

    // Files info: directories first, then the streamed files.
    h.push(0x05);
    let num_files = opts.dirs.len() + folders.iter().map(|f| f.files.len()).sum::<usize>();
    h.extend(packed(num_files as u64));

    if !opts.dirs.is_empty() {
        let mut bits = vec![0u8; num_files.div_ceil(8)];
        for i in 0..opts.dirs.len() {
            bits[i / 8] |= 0x80 >> (i % 8);
        }
        h.push(0x0E); // kEmptyStream
        h.extend(packed(bits.len() as u64));
        h.extend_from_slice(&bits);
    }

    let mut names = vec![0x00]; // not external
    for dir in &opts.dirs {
        names.extend(utf16z(dir));
    }
    for folder in folders {
        for (name, _) in &folder.files {
            names.extend(utf16z(name));
        }
    }
    h.push(0x11); // kName
    h.extend(packed(names.len() as u64));
    h.extend_from_slice(&names);

    h.push(0x00); // end of files info
    h.push(0x00); // end of header
    h
}

/// Streams info describing the plain header as one stored pack stream.
fn build_encoded_header(pack_pos: u64, header: &[u8]) -> Vec<u8> {
    let mut e = vec![0x17]; // kEncodedHeader
    e.push(0x06);
    e.extend(packed(pack_pos));
    e.extend(packed(1));
    e.push(0x09);
    e.extend(packed(header.len() as u64));
    e.push(0x00);

    e.push(0x07);
    e.push(0x0B);
    e.extend(packed(1));
    e.push(0x00);
    e.extend(packed(1));
    e.push(0x01); // flags: one-byte method id
    e.push(0x00); // copy
    e.push(0x0C);
    e.extend(packed(header.len() as u64));
    e.push(0x0A);
    e.push(0x01);
    e.extend_from_slice(&crc32(header).to_le_bytes());
    e.push(0x00);

    e.push(0x00);
    e
}

fn assemble(pack_region: &[u8], next_header: &[u8]) -> Vec<u8> {
    let mut start = Vec::new();
    start.extend_from_slice(&(pack_region.len() as u64).to_le_bytes());
    start.extend_from_slice(&(next_header.len() as u64).to_le_bytes());
    start.extend_from_slice(&crc32(next_header).to_le_bytes());

    let mut out = Vec::new();
    out.extend_from_slice(&[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C]);
    out.extend_from_slice(&[0, 4]);
    out.extend_from_slice(&crc32(&start).to_le_bytes());
    out.extend_from_slice(&start);
    out.extend_from_slice(pack_region);
    out.extend_from_slice(next_header);
    out
}

pub fn build_archive(folders: &[FolderSpec], opts: &BuildOpts) -> Vec<u8> {
    let mut pack_region = Vec::new();
    for folder in folders {
        pack_region.extend(folder.pack_data());
    }
    let header = build_header(folders, opts);

    if !opts.encoded_header {
        return assemble(&pack_region, &header);
    }

    // Ship the plain header as an extra pack stream and point the start
    // header at a tiny encoded-header blob instead.
    let encoded = build_encoded_header(pack_region.len() as u64, &header);
    pack_region.extend_from_slice(&header);
    assemble(&pack_region, &encoded)
}
