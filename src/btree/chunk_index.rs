//! Dispatches to the right chunk index implementation by sniffing the
//! 4-byte signature at the index's address, which is the only way to tell
//! versions 1–3 data layout messages apart (they don't declare an index
//! type the way version 4 does).

use crate::error::{Hdf5Error, Result};
use crate::message::layout::ChunkIndexType;
use crate::reader::ByteReader;

use super::{chunk_v1, chunk_v2, extensible_array, fixed_array, ChunkEntry};

pub fn read_chunk_entries(
    r: &ByteReader,
    addr: u64,
    declared_index_type: ChunkIndexType,
    dims: &[u64],
    chunk_dims: &[u64],
    element_byte_size: u64,
    filtered: bool,
    single_chunk_filter: Option<(u64, u32)>,
) -> Result<Vec<ChunkEntry>> {
    if declared_index_type == ChunkIndexType::SingleChunk {
        // Only a filtered SingleChunk layout carries an explicit size; an
        // unfiltered one stores exactly `chunk_byte_size()` bytes, which the
        // caller falls back to when `size` is 0.
        let (size, filter_mask) = single_chunk_filter.unwrap_or((0, 0));
        return Ok(vec![ChunkEntry { offset: vec![0; dims.len()], addr, size, filter_mask }]);
    }
    if declared_index_type == ChunkIndexType::Implicit {
        return implicit_entries(dims, chunk_dims, addr, element_byte_size);
    }

    let signature = r.at(addr).peek_bytes(4)?;
    match &signature[..] {
        b"TREE" => chunk_v1::traverse(r, addr, dims.len()),
        b"BTHD" => chunk_v2::traverse(r, addr, dims, chunk_dims, filtered),
        b"FAHD" => fixed_array::traverse(r, addr, dims, chunk_dims, filtered),
        b"EAHD" => extensible_array::traverse(r, addr, chunk_dims, filtered),
        other => Err(Hdf5Error::malformed(
            "chunk index",
            addr,
            format!("unrecognised chunk index signature {other:?}"),
        )),
    }
}

/// Implicit indexing stores every possible chunk contiguously, whether or
/// not it has been written; chunk addresses are derived arithmetically
/// rather than read from an index structure.
fn implicit_entries(dims: &[u64], chunk_dims: &[u64], base_addr: u64, element_byte_size: u64) -> Result<Vec<ChunkEntry>> {
    let chunks_per_dim: Vec<u64> = dims
        .iter()
        .zip(chunk_dims.iter())
        .map(|(&extent, &chunk)| if chunk == 0 { 1 } else { (extent + chunk - 1) / chunk })
        .collect();
    let total_chunks: u64 = chunks_per_dim.iter().product();
    let chunk_bytes: u64 = chunk_dims.iter().product::<u64>() * element_byte_size;

    let mut out = Vec::with_capacity(total_chunks as usize);
    for linear in 0..total_chunks {
        let mut idx = linear;
        let mut offset = vec![0u64; chunks_per_dim.len()];
        for d in (0..chunks_per_dim.len()).rev() {
            let extent = chunks_per_dim[d].max(1);
            offset[d] = (idx % extent) * chunk_dims[d];
            idx /= extent;
        }
        out.push(ChunkEntry { offset, addr: base_addr + linear * chunk_bytes, size: chunk_bytes, filter_mask: 0 });
    }
    Ok(out)
}
