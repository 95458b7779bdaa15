use super::{BindPair, CoderInfo};

use alloc::vec::Vec;

use thiserror::Error;

/// Structural defects of a single folder's coder graph.
///
/// Any of these means the header is corrupt; the archive is unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FolderError {
    #[error("every output stream is consumed by a bind pair")]
    NoFreeOutStream,
    #[error("bind pair references a stream index outside the folder")]
    BindPairOutOfRange,
    #[error("stream index is bound by more than one bind pair")]
    DuplicateBinding,
    #[error("pack stream index {0} is not an input stream of the folder")]
    PackStreamOutOfRange(u64),
    #[error("pack stream index {0} is already bound to a coder output")]
    PackStreamBound(u64),
    #[error("folder declares {declared} pack streams but has {free} free inputs")]
    PackStreamCountMismatch { declared: usize, free: usize },
    #[error("folder declares {declared} unpack sizes for {outputs} output streams")]
    UnpackSizeCountMismatch { declared: usize, outputs: usize },
}

/// A solid block: the coders, bind pairs and pack-stream inputs that
/// together decode one contiguous compressed region.
///
/// Stream indices are global over the folder: input stream `i` of coder `c`
/// has the global index `sum(num_in_streams of coders before c) + i`, and
/// likewise for outputs. A global index is either bound (wired to another
/// coder by a bind pair) or free — a free input is fed by one of the
/// archive's pack streams, and the highest free output is the folder's
/// decoded result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Folder {
    pub coders: Vec<CoderInfo>,
    pub bind_pairs: Vec<BindPair>,
    /// Global input-stream indices fed by pack streams, in the order the
    /// folder consumes pack streams from the archive.
    pub pack_streams: Vec<u64>,
    /// Unpacked size of every output stream, in global stream order.
    pub unpack_sizes: Vec<u64>,
    /// CRC of the folder's final output, when the header recorded one.
    pub unpack_crc: Option<u32>,
}

impl Folder {
    /// Sum of all coders' output-stream counts.
    pub fn num_out_streams(&self) -> usize {
        return self.coders.iter().map(|c| c.num_out_streams).sum();
    }

    /// Sum of all coders' input-stream counts.
    pub fn num_in_streams(&self) -> usize {
        return self.coders.iter().map(|c| c.num_in_streams).sum();
    }

    /// Position in `bind_pairs` of the pair consuming the given input
    /// stream, if it is bound.
    pub fn find_bind_pair_for_in_stream(&self, in_index: u64) -> Option<usize> {
        return self.bind_pairs.iter().position(|bp| bp.in_index == in_index);
    }

    /// Position in `bind_pairs` of the pair consuming the given output
    /// stream, if it is bound.
    pub fn find_bind_pair_for_out_stream(&self, out_index: u64) -> Option<usize> {
        return self
            .bind_pairs
            .iter()
            .position(|bp| bp.out_index == out_index);
    }

    /// Position of the given input-stream index in the folder's pack-stream
    /// list, if it is fed externally.
    pub fn find_pack_stream_index(&self, in_index: u64) -> Option<usize> {
        return self.pack_streams.iter().position(|&ps| ps == in_index);
    }

    /// The global index of the folder's result stream: the highest output
    /// stream not consumed by any bind pair.
    pub fn final_out_stream_index(&self) -> Result<u64, FolderError> {
        for idx in (0..self.num_out_streams() as u64).rev() {
            if self.find_bind_pair_for_out_stream(idx).is_none() {
                return Ok(idx);
            }
        }
        return Err(FolderError::NoFreeOutStream);
    }

    /// Unpacked size of the folder's result stream. A folder without coders
    /// decodes to nothing.
    pub fn unpack_size(&self) -> Result<u64, FolderError> {
        if self.coders.is_empty() {
            return Ok(0);
        }
        let idx = self.final_out_stream_index()?;
        return Ok(self.unpack_sizes[idx as usize]);
    }

    /// Unpacked size of an arbitrary output stream.
    pub fn unpack_size_of(&self, out_index: usize) -> Option<u64> {
        return self.unpack_sizes.get(out_index).copied();
    }

    /// Check the folder's structural invariants.
    ///
    /// The parser trusts its own index arithmetic while building a folder;
    /// this runs once per folder when the database is assembled and rejects
    /// malformed or adversarial headers.
    pub fn validate(&self) -> Result<(), FolderError> {
        let num_in = self.num_in_streams() as u64;
        let num_out = self.num_out_streams() as u64;

        if self.unpack_sizes.len() != num_out as usize {
            return Err(FolderError::UnpackSizeCountMismatch {
                declared: self.unpack_sizes.len(),
                outputs: num_out as usize,
            });
        }

        for (i, bp) in self.bind_pairs.iter().enumerate() {
            if bp.in_index >= num_in || bp.out_index >= num_out {
                return Err(FolderError::BindPairOutOfRange);
            }
            let earlier = &self.bind_pairs[..i];
            if earlier.iter().any(|e| e.in_index == bp.in_index)
                || earlier.iter().any(|e| e.out_index == bp.out_index)
            {
                return Err(FolderError::DuplicateBinding);
            }
        }

        for (i, &ps) in self.pack_streams.iter().enumerate() {
            if ps >= num_in {
                return Err(FolderError::PackStreamOutOfRange(ps));
            }
            if self.find_bind_pair_for_in_stream(ps).is_some() {
                return Err(FolderError::PackStreamBound(ps));
            }
            if self.pack_streams[..i].contains(&ps) {
                return Err(FolderError::PackStreamCountMismatch {
                    declared: self.pack_streams.len(),
                    free: (num_in as usize).saturating_sub(self.bind_pairs.len()),
                });
            }
        }

        let free_inputs = (num_in as usize) - self.bind_pairs.len().min(num_in as usize);
        if self.pack_streams.len() != free_inputs {
            return Err(FolderError::PackStreamCountMismatch {
                declared: self.pack_streams.len(),
                free: free_inputs,
            });
        }

        if num_out > 0 {
            self.final_out_stream_index()?;
        }
        return Ok(());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::archive::CoderInfo;
    use alloc::vec;

    fn stored_folder(size: u64) -> Folder {
        return Folder {
            coders: vec![CoderInfo::simple(vec![0x00], None)],
            bind_pairs: vec![],
            pack_streams: vec![0],
            unpack_sizes: vec![size],
            unpack_crc: None,
        };
    }

    /// 2 simple coders chained: pack -> coder 0 -> coder 1 -> result.
    /// Output 0 (of coder 0) feeds input 1 (of coder 1).
    fn chained_folder() -> Folder {
        return Folder {
            coders: vec![
                CoderInfo::simple(vec![0x21], None),
                CoderInfo::simple(vec![0x03], None),
            ],
            bind_pairs: vec![BindPair {
                in_index: 1,
                out_index: 0,
            }],
            pack_streams: vec![0],
            unpack_sizes: vec![100, 120],
            unpack_crc: None,
        };
    }

    #[test]
    fn out_stream_total_matches_coder_sum() {
        let f = chained_folder();
        let by_hand: usize = f.coders.iter().map(|c| c.num_out_streams).sum();
        assert_eq!(f.num_out_streams(), by_hand);
        assert_eq!(f.num_out_streams(), 2);
    }

    #[test]
    fn stored_folder_unpack_size_is_sole_output() {
        let f = stored_folder(42);
        assert_eq!(f.final_out_stream_index(), Ok(0));
        assert_eq!(f.unpack_size(), Ok(42));
        assert!(f.validate().is_ok());
    }

    #[test]
    fn chained_folder_resolves_final_stream() {
        let f = chained_folder();
        // Coder 0's output is consumed by the bind pair at position 0.
        assert_eq!(f.find_bind_pair_for_out_stream(0), Some(0));
        // Coder 1's output is free, so the folder's size is its size.
        assert_eq!(f.final_out_stream_index(), Ok(1));
        assert_eq!(f.unpack_size(), Ok(120));
        assert!(f.validate().is_ok());
    }

    #[test]
    fn fully_bound_outputs_are_an_error() {
        let mut f = chained_folder();
        f.bind_pairs.push(BindPair {
            in_index: 0,
            out_index: 1,
        });
        assert_eq!(f.final_out_stream_index(), Err(FolderError::NoFreeOutStream));
        assert_eq!(f.unpack_size(), Err(FolderError::NoFreeOutStream));
    }

    #[test]
    fn pack_stream_count_mismatch_is_rejected() {
        // Declares 3 pack streams, but two coders with one bind pair leave
        // only one free input.
        let mut f = chained_folder();
        f.pack_streams = vec![0, 1, 2];
        assert!(matches!(
            f.validate(),
            Err(FolderError::PackStreamCountMismatch { declared: 3, free: 1 })
                | Err(FolderError::PackStreamBound(_))
        ));
    }

    #[test]
    fn bound_pack_stream_is_rejected() {
        let mut f = chained_folder();
        // Input 1 is consumed by the bind pair, it cannot also be packed.
        f.pack_streams = vec![1];
        assert_eq!(f.validate(), Err(FolderError::PackStreamBound(1)));
    }

    #[test]
    fn bind_pair_lookups() {
        let f = chained_folder();
        assert_eq!(f.find_bind_pair_for_in_stream(1), Some(0));
        assert_eq!(f.find_bind_pair_for_in_stream(0), None);
        assert_eq!(f.find_pack_stream_index(0), Some(0));
        assert_eq!(f.find_pack_stream_index(1), None);
    }
}
