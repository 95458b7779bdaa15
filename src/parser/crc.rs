//! The CRC-32 flavour used by the 7z container: the standard reflected
//! polynomial, same as zip and gzip.

use crc::{Crc, CRC_32_ISO_HDLC};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub fn sevenz_crc(input: &[u8]) -> u32 {
    return CRC32.checksum(input);
}
