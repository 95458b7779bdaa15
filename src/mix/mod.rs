//! Generic coder-graph execution.
//!
//! This layer knows nothing about the 7z header layout: it takes a
//! [`Folder`]'s wiring, the raw pack-stream bytes feeding it, and a codec
//! registry, and produces the folder's decoded output by running coders in
//! dependency order. It is shared by entry extraction and encoded-header
//! decoding, and would serve any other container built on the same
//! coder/bind-pair scheme.

mod bind_info;
pub use bind_info::*;

use crate::archive::{CoderInfo, Folder};
use crate::codec::{Codec, CodecError, CodecRegistry};

use alloc::vec;
use alloc::vec::Vec;

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Decode one folder to its final output stream.
///
/// `packs` are the folder's pack streams in declaration order (one slice
/// per entry of `folder.pack_streams`). Coders run as their inputs become
/// available; intermediate outputs are kept in memory, which matches the
/// byte-slice model of the rest of the crate.
pub fn decode_folder(
    folder: &Folder,
    packs: &[&[u8]],
    registry: &dyn CodecRegistry,
) -> Result<Vec<u8>, CodecError> {
    if folder.coders.is_empty() {
        return Ok(Vec::new());
    }
    if packs.len() != folder.pack_streams.len() {
        return Err(CodecError::Graph("pack stream count mismatch"));
    }
    let final_out = folder
        .final_out_stream_index()
        .map_err(|_| CodecError::Graph("no unbound output stream"))?;

    let bind = BindInfo::from_folder(folder);
    let mut state = vec![Visit::Unvisited; folder.coders.len()];
    let mut outputs: Vec<Option<Vec<Vec<u8>>>> = vec![None; folder.coders.len()];

    let (final_coder, final_slot) = bind.find_out_stream(final_out as usize);
    run_coder(folder, &bind, packs, registry, final_coder, &mut state, &mut outputs)?;

    let outs = outputs[final_coder]
        .take()
        .ok_or(CodecError::Graph("final coder produced no output"))?;
    return Ok(outs.into_iter().nth(final_slot).unwrap_or_default());
}

/// Evaluate one coder, recursing into the coders feeding it first.
fn run_coder(
    folder: &Folder,
    bind: &BindInfo,
    packs: &[&[u8]],
    registry: &dyn CodecRegistry,
    coder_index: usize,
    state: &mut Vec<Visit>,
    outputs: &mut Vec<Option<Vec<Vec<u8>>>>,
) -> Result<(), CodecError> {
    match state[coder_index] {
        Visit::Done => return Ok(()),
        Visit::InProgress => return Err(CodecError::Graph("bind pairs form a cycle")),
        Visit::Unvisited => state[coder_index] = Visit::InProgress,
    }

    let coder = &folder.coders[coder_index];
    let in_base = bind.coder_in_stream_base(coder_index);
    let out_base = bind.coder_out_stream_base(coder_index);

    // Resolve each input slot to its producer and make sure every producing
    // coder has run before we borrow its output.
    let mut sources = Vec::with_capacity(coder.num_in_streams);
    for slot in 0..coder.num_in_streams {
        let global = (in_base + slot) as u64;
        if let Some(bp) = folder.find_bind_pair_for_in_stream(global) {
            let out_index = folder.bind_pairs[bp].out_index as usize;
            let (producer, producer_slot) = bind.find_out_stream(out_index);
            run_coder(folder, bind, packs, registry, producer, state, outputs)?;
            sources.push((Some(producer), producer_slot));
        } else {
            let pack = folder
                .find_pack_stream_index(global)
                .ok_or(CodecError::Graph("free input stream has no pack stream"))?;
            sources.push((None, pack));
        }
    }

    let codec = find_codec(registry, coder)?;
    let out_sizes: Vec<u64> = (0..coder.num_out_streams)
        .map(|slot| folder.unpack_sizes[out_base + slot])
        .collect();

    log::trace!(
        "running coder {} ({}): {} in, {} out",
        coder_index,
        codec.name(),
        coder.num_in_streams,
        coder.num_out_streams
    );

    let produced = {
        let inputs: Vec<&[u8]> = sources
            .iter()
            .map(|&(producer, slot)| match producer {
                Some(p) => outputs[p].as_ref().expect("producer ran")[slot].as_slice(),
                None => packs[slot],
            })
            .collect();
        codec.decode(&inputs, &out_sizes)?
    };

    if produced.len() != coder.num_out_streams {
        return Err(CodecError::Graph("codec produced wrong output stream count"));
    }
    for (stream, &size) in produced.iter().zip(out_sizes.iter()) {
        if stream.len() as u64 != size {
            return Err(CodecError::OutputSizeMismatch {
                declared: size,
                produced: stream.len() as u64,
            });
        }
    }

    outputs[coder_index] = Some(produced);
    state[coder_index] = Visit::Done;
    return Ok(());
}

/// Look up a decoder for the coder, falling back to alternative method
/// variants when the primary one is not registered.
fn find_codec<'r>(
    registry: &'r dyn CodecRegistry,
    coder: &CoderInfo,
) -> Result<&'r dyn Codec, CodecError> {
    for alt in &coder.alt_coders {
        if let Some(codec) = registry.find(&alt.method_id) {
            return Ok(codec);
        }
    }
    return Err(CodecError::UnsupportedMethod(Vec::from(coder.method_id())));
}
