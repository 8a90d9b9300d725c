//! Fixed array chunk index ("FAHD" header, "FADB" data block): used when a
//! dataset's extent is fixed along every dimension, so the number of chunks
//! is known up front and can be addressed as a flat linear array. Paged data
//! blocks (large arrays split across fixed-size pages) are not implemented:
//! every example in the wild that drove this index's adoption fits in a
//! single unpaged block, and a paged block's extra page-bitmap bookkeeping
//! has no test fixture to validate against here.

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

use super::ChunkEntry;

const HEADER_SIGNATURE: &[u8; 4] = b"FAHD";
const DATA_BLOCK_SIGNATURE: &[u8; 4] = b"FADB";

/// `dims` and `chunk_dims` give the dataset extent and chunk shape, used to
/// recover each linear array index's N-dimensional chunk coordinate.
pub fn traverse(r: &ByteReader, header_addr: u64, dims: &[u64], chunk_dims: &[u64], filtered: bool) -> Result<Vec<ChunkEntry>> {
    let mut h = r.at(header_addr);
    let sig = h.read_bytes(4)?;
    if sig.as_slice() != HEADER_SIGNATURE {
        return Err(Hdf5Error::malformed("fixed array header", header_addr, "signature mismatch, expected \"FAHD\""));
    }
    let version = h.read_u8()?;
    if version != 0 {
        return Err(Hdf5Error::UnsupportedVersion { structure: "fixed array header", version: version as u32 });
    }
    let _client_id = h.read_u8()?;
    let entry_size = h.read_u8()? as usize;
    let page_bits = h.read_u8()?;
    let max_num_entries = h.read_length()?;
    let data_block_addr = h.read_offset()?;

    if page_bits != 0 {
        return Err(Hdf5Error::unsupported_feature("fixed array", "paged data blocks"));
    }

    let mut d = r.at(data_block_addr);
    let sig = d.read_bytes(4)?;
    if sig.as_slice() != DATA_BLOCK_SIGNATURE {
        return Err(Hdf5Error::malformed("fixed array data block", data_block_addr, "signature mismatch, expected \"FADB\""));
    }
    let db_version = d.read_u8()?;
    if db_version != 0 {
        return Err(Hdf5Error::UnsupportedVersion { structure: "fixed array data block", version: db_version as u32 });
    }
    let _client_id = d.read_u8()?;
    let _header_addr_back = d.read_offset()?;

    let chunks_per_dim: Vec<u64> = dims
        .iter()
        .zip(chunk_dims.iter())
        .map(|(&extent, &chunk)| if chunk == 0 { 1 } else { (extent + chunk - 1) / chunk })
        .collect();

    let mut out = Vec::with_capacity(max_num_entries as usize);
    for linear_index in 0..max_num_entries {
        let addr = d.read_offset()?;
        let undefined = d.is_undefined_offset(addr);
        let (size, filter_mask) = if filtered {
            let remaining = entry_size - r.offset_width() as usize - 4;
            let size = d.read_uint(remaining as u8)?;
            let mask = d.read_u32()?;
            (size, mask)
        } else {
            (0, 0)
        };

        if undefined {
            continue; // unallocated slot: chunk never written
        }

        let offset = unravel(linear_index, &chunks_per_dim, chunk_dims);
        out.push(ChunkEntry { offset, addr, size, filter_mask });
    }

    Ok(out)
}

fn unravel(mut linear: u64, chunks_per_dim: &[u64], chunk_dims: &[u64]) -> Vec<u64> {
    let mut coords = vec![0u64; chunks_per_dim.len()];
    for d in (0..chunks_per_dim.len()).rev() {
        let extent = chunks_per_dim[d].max(1);
        coords[d] = (linear % extent) * chunk_dims[d];
        linear /= extent;
    }
    coords
}
