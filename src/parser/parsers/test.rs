use super::*;
use crate::archive::BindPair;
use crate::parser::crc::sevenz_crc;

use alloc::vec;
use alloc::vec::Vec;

#[test]
fn sevenz_uint64_decodes_reference_values() {
    let test_cases: &[(&[u8], u64, usize)] = &[
        (&[0; 8], 0, 7),
        (&[0b0111_1111; 8], 127, 7),
        (&[0b1000_0000, 42, 0, 0, 0, 0, 0, 0], 42, 6),
        (&[0b1000_1111, 42, 0, 0, 0, 0, 0, 0], 3882, 6),
        (&[0b1100_0010, 0x34, 0x12], 0x21234, 0),
        (
            &[0xFF, 1, 2, 3, 4, 5, 6, 7, 8],
            0x0807_0605_0403_0201,
            0,
        ),
    ];

    for (input, expected, expected_len_remaining) in test_cases {
        let (remainder, res) = sevenz_uint64(input).unwrap();
        assert_eq!(res, *expected);
        assert_eq!(remainder.len(), *expected_len_remaining);
    }
}

#[test]
fn bool_byte_rejects_other_values() {
    assert_eq!(bool_byte(&[0, 9]).unwrap(), (&[9u8][..], false));
    assert_eq!(bool_byte(&[1]).unwrap(), (&[][..], true));
    assert!(bool_byte(&[2]).is_err());
}

#[test]
fn bool_vector_is_msb_first() {
    let (rest, bits) = bool_vector(&[0b1010_0000, 7], 3).unwrap();
    assert_eq!(rest, &[7]);
    assert_eq!(bits.iter().by_vals().collect::<Vec<_>>(), vec![true, false, true]);

    let (_, bits) = bool_vector(&[0xFF, 0xC0], 10).unwrap();
    assert_eq!(bits.count_ones(), 10);
}

#[test]
fn digests_with_partial_definitions() {
    // Two entries, only the first defined.
    let input = [0x00, 0b1000_0000, 0xEF, 0xBE, 0xAD, 0xDE];
    let (rest, crcs) = digests(&input, 2).unwrap();
    assert!(rest.is_empty());
    assert_eq!(crcs, vec![Some(0xDEAD_BEEF), None]);

    // All-defined shortcut byte.
    let input = [0x01, 0x01, 0x00, 0x00, 0x00];
    let (_, crcs) = digests(&input, 1).unwrap();
    assert_eq!(crcs, vec![Some(1)]);
}

#[test]
fn coder_simple() {
    let (rest, c) = coder(&[0x01, 0x00, 0xAA]).unwrap();
    assert_eq!(rest, &[0xAA]);
    assert!(c.is_simple());
    assert_eq!(c.method_id(), &[0x00]);
    assert_eq!(c.properties(), None);
}

#[test]
fn coder_complex_with_properties() {
    // id size 1 | complex | attributes
    let input = [0x31, 0x21, 0x02, 0x01, 0x02, 0x5D, 0x00];
    let (rest, c) = coder(&input).unwrap();
    assert!(rest.is_empty());
    assert_eq!(c.method_id(), &[0x21]);
    assert_eq!(c.num_in_streams, 2);
    assert_eq!(c.num_out_streams, 1);
    assert_eq!(c.properties(), Some(&[0x5D, 0x00][..]));
    assert!(!c.is_simple());
}

#[test]
fn coder_alternative_variants() {
    // Two variants: bit 7 of the first flags byte announces a second record.
    let input = [0x81, 0x21, 0x01, 0x00];
    let (rest, c) = coder(&input).unwrap();
    assert!(rest.is_empty());
    assert_eq!(c.alt_coders.len(), 2);
    assert_eq!(c.method_id(), &[0x21]);
    assert_eq!(c.alt_coders[1].method_id, vec![0x00]);
}

#[test]
fn folder_with_single_coder_derives_its_pack_stream() {
    let (rest, f) = folder(&[0x01, 0x01, 0x00]).unwrap();
    assert!(rest.is_empty());
    assert_eq!(f.coders.len(), 1);
    assert!(f.bind_pairs.is_empty());
    // The sole free input is implied, not stored.
    assert_eq!(f.pack_streams, vec![0]);
}

#[test]
fn folder_with_chained_coders() {
    // Two simple coders; one bind pair (in 1 <- out 0); pack stream implied.
    let input = [0x02, 0x01, 0x21, 0x01, 0x00, 0x01, 0x00];
    let (rest, f) = folder(&input).unwrap();
    assert!(rest.is_empty());
    assert_eq!(f.coders.len(), 2);
    assert_eq!(
        f.bind_pairs,
        vec![BindPair {
            in_index: 1,
            out_index: 0
        }]
    );
    assert_eq!(f.pack_streams, vec![0]);
}

#[test]
fn folder_without_coders_is_rejected() {
    let res = folder(&[0x00]);
    assert!(matches!(
        res,
        Err(nom::Err::Failure(SevenZParserError {
            kind: SevenZParserErrorKind::EmptyFolder,
            ..
        }))
    ));
}

#[test]
fn pack_info_reads_sizes_and_optional_digests() {
    // pack_pos 0, one stream of 19 bytes, no CRCs.
    let input = [0x00, 0x01, 0x09, 0x13, 0x00];
    let (rest, pi) = pack_info(&input).unwrap();
    assert!(rest.is_empty());
    assert_eq!(pi.pack_pos, 0);
    assert_eq!(pi.sizes, vec![19]);
    assert_eq!(pi.crcs, vec![None]);

    // Same with a CRC block.
    let input = [0x00, 0x01, 0x09, 0x13, 0x0A, 0x01, 0x78, 0x56, 0x34, 0x12, 0x00];
    let (_, pi) = pack_info(&input).unwrap();
    assert_eq!(pi.crcs, vec![Some(0x1234_5678)]);
}

#[test]
fn unpack_info_fills_sizes_and_crcs_into_folders() {
    let input = [
        0x0B, // kFolder
        0x01, // one folder
        0x00, // not external
        0x01, 0x01, 0x00, // folder: one stored coder
        0x0C, // kCodersUnpackSize
        0x2A, // 42
        0x0A, // kCRC
        0x01, 0xEF, 0xBE, 0xAD, 0xDE, // all defined, one digest
        0x00, // kEnd
    ];
    let (rest, folders) = unpack_info(&input).unwrap();
    assert!(rest.is_empty());
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].unpack_sizes, vec![42]);
    assert_eq!(folders[0].unpack_crc, Some(0xDEAD_BEEF));
    assert_eq!(folders[0].unpack_size(), Ok(42));
}

#[test]
fn substreams_info_derives_the_last_size_per_folder() {
    let (_, folders) = unpack_info(&[
        0x0B, 0x01, 0x00, 0x01, 0x01, 0x00, 0x0C, 0x0A, 0x00,
    ])
    .unwrap();
    assert_eq!(folders[0].unpack_size(), Ok(10));

    let input = [
        0x0D, 0x02, // kNumUnpackStream: 2 in the only folder
        0x09, 0x03, // kSize: first substream is 3 bytes, second derived
        0x0A, // kCRC: both substream digests unknown
        0x01, // all defined
        0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
        0x00, // kEnd
    ];
    let (rest, sub) = substreams_info(&input, &folders).unwrap();
    assert!(rest.is_empty());
    assert_eq!(sub.num_unpack_streams, vec![2]);
    assert_eq!(sub.sizes, vec![3, 7]);
    assert_eq!(sub.crcs, vec![Some(1), Some(2)]);
}

#[test]
fn substreams_info_reuses_known_folder_digests() {
    let (_, folders) = unpack_info(&[
        0x0B, 0x01, 0x00, 0x01, 0x01, 0x00, 0x0C, 0x0A, // one folder, size 10
        0x0A, 0x01, 0x44, 0x33, 0x22, 0x11, // folder digest
        0x00,
    ])
    .unwrap();

    // One substream per folder and no explicit blocks at all: everything
    // falls back to the folder's own size and digest.
    let (_, sub) = substreams_info(&[0x00], &folders).unwrap();
    assert_eq!(sub.num_unpack_streams, vec![1]);
    assert_eq!(sub.sizes, vec![10]);
    assert_eq!(sub.crcs, vec![Some(0x1122_3344)]);
}

#[test]
fn substreams_info_rejects_oversized_substreams() {
    let (_, folders) =
        unpack_info(&[0x0B, 0x01, 0x00, 0x01, 0x01, 0x00, 0x0C, 0x0A, 0x00]).unwrap();
    // First substream claims 11 bytes of a 10-byte folder.
    let input = [0x0D, 0x02, 0x09, 0x0B, 0x00];
    let res = substreams_info(&input, &folders);
    assert!(matches!(
        res,
        Err(nom::Err::Failure(SevenZParserError {
            kind: SevenZParserErrorKind::SubStreamSizeOverflow,
            ..
        }))
    ));
}

#[test]
fn files_info_parses_properties_and_skips_unknown_ones() {
    let mut input: Vec<u8> = vec![
        0x02, // two files
        0x0E, 0x01, 0b0100_0000, // kEmptyStream: second entry has no stream
        0x0F, 0x01, 0x00, // kEmptyFile: the empty stream is a directory
    ];
    // kName: external flag + "a\0" + "d\0" as UTF-16LE.
    input.extend_from_slice(&[0x11, 0x09, 0x00]);
    input.extend_from_slice(&[0x61, 0x00, 0x00, 0x00, 0x64, 0x00, 0x00, 0x00]);
    // An unknown property id that must be skipped by its size.
    input.extend_from_slice(&[0x7F, 0x02, 0xAB, 0xCD]);
    // kDummy padding, all zero.
    input.extend_from_slice(&[0x19, 0x02, 0x00, 0x00]);
    input.push(0x00); // kEnd

    let (rest, fi) = files_info(&input).unwrap();
    assert!(rest.is_empty());
    assert_eq!(fi.num_files, 2);
    assert_eq!(fi.properties.len(), 3);

    let names: Vec<_> = fi
        .properties
        .iter()
        .filter_map(|p| match p {
            FilesProperty::Names(n) => Some(n.clone()),
            _ => None,
        })
        .next()
        .unwrap();
    assert_eq!(names.len(), 2);
    assert_eq!(names[0].clone().right().unwrap(), "a");
    assert_eq!(names[1].clone().right().unwrap(), "d");
}

#[test]
fn files_info_rejects_nonzero_dummy() {
    let input = [0x01, 0x19, 0x01, 0x07, 0x00];
    let res = files_info(&input);
    assert!(matches!(
        res,
        Err(nom::Err::Failure(SevenZParserError {
            kind: SevenZParserErrorKind::DummyNotAllZeroes,
            ..
        }))
    ));
}

#[test]
fn signature_header_roundtrip() {
    let start = [
        19, 0, 0, 0, 0, 0, 0, 0, // next header offset
        90, 0, 0, 0, 0, 0, 0, 0, // next header size
        0x35, 0x91, 0xD6, 0x39, // next header CRC
    ];
    let mut input: Vec<u8> = Vec::new();
    input.extend_from_slice(&MAGIC);
    input.extend_from_slice(&[0, 4]);
    input.extend_from_slice(&sevenz_crc(&start).to_le_bytes());
    input.extend_from_slice(&start);

    let (_, sig) = signature_header(&input).unwrap();
    assert_eq!(sig.archive_version, ArchiveVersion { major: 0, minor: 4 });
    assert_eq!(sig.start_header.next_header_offset, 19);
    assert_eq!(sig.start_header.next_header_size, 90);

    // Flip a start-header byte: the CRC check must reject it.
    let mut corrupt = input.clone();
    corrupt[12] += 1;
    assert!(matches!(
        signature_header(&corrupt),
        Err(nom::Err::Failure(SevenZParserError {
            kind: SevenZParserErrorKind::Crc { .. },
            ..
        }))
    ));
}

#[test]
fn next_header_dispatches_plain_headers() {
    // kHeader with a lone files-info section: one file named "a".
    let input = [
        0x01, // kHeader
        0x05, // kFilesInfo
        0x01, // one file
        0x11, 0x05, 0x00, 0x61, 0x00, 0x00, 0x00, // kName, size, external, "a"
        0x00, // end of files info
        0x00, // end of header
    ];
    let (rest, nh) = next_header(&input).unwrap();
    assert!(rest.is_empty());
    let header = match nh {
        NextHeader::Plain(h) => h,
        NextHeader::Encoded(_) => panic!("expected a plain header"),
    };
    assert_eq!(header.files.unwrap().num_files, 1);
    assert!(header.main_streams.is_none());
}
