use crate::archive::{BindPair, Folder};

use alloc::vec::Vec;

/// Stream counts of one coder, stripped of method information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoderStreams {
    pub num_in_streams: usize,
    pub num_out_streams: usize,
}

/// A read-only view of a coder graph for the stream-mixing layer.
///
/// Unlike [`Folder`] it carries no method ids or sizes, only the wiring,
/// plus explicit lists of the graph's free (externally visible) stream
/// indices. Built on demand from a folder and discarded after use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindInfo {
    pub coders: Vec<CoderStreams>,
    pub bind_pairs: Vec<BindPair>,
    /// Free input-stream indices, in pack-stream consumption order.
    pub in_streams: Vec<u64>,
    /// Free output-stream indices, ascending.
    pub out_streams: Vec<u64>,
}

impl BindInfo {
    pub fn from_folder(folder: &Folder) -> BindInfo {
        let coders: Vec<CoderStreams> = folder
            .coders
            .iter()
            .map(|c| CoderStreams {
                num_in_streams: c.num_in_streams,
                num_out_streams: c.num_out_streams,
            })
            .collect();
        let out_streams = (0..folder.num_out_streams() as u64)
            .filter(|&idx| folder.find_bind_pair_for_out_stream(idx).is_none())
            .collect();
        return BindInfo {
            coders,
            bind_pairs: folder.bind_pairs.clone(),
            in_streams: folder.pack_streams.clone(),
            out_streams,
        };
    }

    pub fn total_in_streams(&self) -> usize {
        return self.coders.iter().map(|c| c.num_in_streams).sum();
    }

    pub fn total_out_streams(&self) -> usize {
        return self.coders.iter().map(|c| c.num_out_streams).sum();
    }

    pub fn find_bind_pair_for_in_stream(&self, in_index: u64) -> Option<usize> {
        return self.bind_pairs.iter().position(|bp| bp.in_index == in_index);
    }

    pub fn find_bind_pair_for_out_stream(&self, out_index: u64) -> Option<usize> {
        return self
            .bind_pairs
            .iter()
            .position(|bp| bp.out_index == out_index);
    }

    /// Global index of the first input stream of the given coder.
    pub fn coder_in_stream_base(&self, coder_index: usize) -> usize {
        return self.coders[..coder_index]
            .iter()
            .map(|c| c.num_in_streams)
            .sum();
    }

    /// Global index of the first output stream of the given coder.
    pub fn coder_out_stream_base(&self, coder_index: usize) -> usize {
        return self.coders[..coder_index]
            .iter()
            .map(|c| c.num_out_streams)
            .sum();
    }

    /// Resolve a global input-stream index to `(coder index, local slot)`.
    ///
    /// # Panics
    ///
    /// Panics if `global` is not below [`total_in_streams`]; passing such an
    /// index is a caller bug, not an archive defect.
    ///
    /// [`total_in_streams`]: BindInfo::total_in_streams
    pub fn find_in_stream(&self, global: usize) -> (usize, usize) {
        let mut remaining = global;
        for (coder_index, coder) in self.coders.iter().enumerate() {
            if remaining < coder.num_in_streams {
                return (coder_index, remaining);
            }
            remaining -= coder.num_in_streams;
        }
        panic!("input stream index {} out of range", global);
    }

    /// Resolve a global output-stream index to `(coder index, local slot)`.
    ///
    /// # Panics
    ///
    /// Panics if `global` is not below [`total_out_streams`]; passing such
    /// an index is a caller bug, not an archive defect.
    ///
    /// [`total_out_streams`]: BindInfo::total_out_streams
    pub fn find_out_stream(&self, global: usize) -> (usize, usize) {
        let mut remaining = global;
        for (coder_index, coder) in self.coders.iter().enumerate() {
            if remaining < coder.num_out_streams {
                return (coder_index, remaining);
            }
            remaining -= coder.num_out_streams;
        }
        panic!("output stream index {} out of range", global);
    }
}
