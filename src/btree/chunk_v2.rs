//! B-tree v2 chunk index ("BTHD" header, "BTLF" leaf, "BTIN" internal):
//! the format used by chunked datasets whose extent can grow along more than
//! one dimension. Only a depth-0 tree (header pointing straight at a single
//! leaf) is walked; internal nodes require a record-count-dependent
//! child-pointer width formula this decoder does not derive, so a tree with
//! depth > 0 is reported as an unsupported feature rather than mis-parsed.

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

use super::ChunkEntry;

const HEADER_SIGNATURE: &[u8; 4] = b"BTHD";
const LEAF_SIGNATURE: &[u8; 4] = b"BTLF";

const RECORD_TYPE_UNFILTERED: u8 = 10;
const RECORD_TYPE_FILTERED: u8 = 11;

fn scaled_offset_width(dim_extent: u64, chunk_extent: u64) -> u8 {
    let max_index = if chunk_extent == 0 { 0 } else { (dim_extent + chunk_extent - 1) / chunk_extent };
    if max_index < (1 << 8) {
        1
    } else if max_index < (1 << 16) {
        2
    } else if max_index < (1u64 << 32) {
        4
    } else {
        8
    }
}

pub fn traverse(r: &ByteReader, header_addr: u64, dims: &[u64], chunk_dims: &[u64], filtered: bool) -> Result<Vec<ChunkEntry>> {
    let mut h = r.at(header_addr);
    let sig = h.read_bytes(4)?;
    if sig.as_slice() != HEADER_SIGNATURE {
        return Err(Hdf5Error::malformed("chunk b-tree v2 header", header_addr, "signature mismatch, expected \"BTHD\""));
    }
    let version = h.read_u8()?;
    if version != 0 {
        return Err(Hdf5Error::UnsupportedVersion { structure: "chunk b-tree v2 header", version: version as u32 });
    }
    let record_type = h.read_u8()?;
    let _node_size = h.read_u32()?;
    let _record_size = h.read_u16()?;
    let depth = h.read_u16()?;
    let _split_percent = h.read_u8()?;
    let _merge_percent = h.read_u8()?;
    let root_addr = h.read_offset()?;
    let num_records_root = h.read_u16()? as usize;
    let total_records = h.read_length()?;

    if total_records == 0 {
        return Ok(Vec::new());
    }
    if depth != 0 {
        return Err(Hdf5Error::unsupported_feature(
            "chunk b-tree v2",
            format!("internal node traversal at depth {depth}"),
        ));
    }

    let rank = dims.len();
    let widths: Vec<u8> = (0..rank).map(|d| scaled_offset_width(dims[d], chunk_dims[d])).collect();

    let expected_type = if filtered { RECORD_TYPE_FILTERED } else { RECORD_TYPE_UNFILTERED };
    if record_type != expected_type {
        return Err(Hdf5Error::malformed(
            "chunk b-tree v2",
            header_addr,
            format!("record type {record_type} does not match dataset filter state"),
        ));
    }

    let mut leaf = r.at(root_addr);
    let sig = leaf.read_bytes(4)?;
    if sig.as_slice() != LEAF_SIGNATURE {
        return Err(Hdf5Error::malformed("chunk b-tree v2 leaf", root_addr, "signature mismatch, expected \"BTLF\""));
    }
    let leaf_version = leaf.read_u8()?;
    if leaf_version != 0 {
        return Err(Hdf5Error::UnsupportedVersion { structure: "chunk b-tree v2 leaf", version: leaf_version as u32 });
    }
    let _leaf_type = leaf.read_u8()?;

    let mut out = Vec::with_capacity(num_records_root);
    for _ in 0..num_records_root {
        let addr = leaf.read_offset()?;
        let (size, filter_mask) = if filtered {
            let size = leaf.read_length()?;
            let mask = leaf.read_u32()?;
            (size, mask)
        } else {
            (0, 0)
        };
        let mut offset = Vec::with_capacity(rank);
        for &w in &widths {
            let scaled = leaf.read_uint(w)?;
            offset.push(scaled * chunk_dims[offset.len()]);
        }
        out.push(ChunkEntry { offset, addr, size, filter_mask });
    }

    Ok(out)
}
