//! B-tree v1 chunk nodes ("TREE", node type 1): the original chunk index,
//! keyed by a chunk's stored size, filter mask, and per-dimension starting
//! coordinate (plus a trailing always-zero element-offset slot).

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

use super::ChunkEntry;

const TREE_SIGNATURE: &[u8; 4] = b"TREE";
const CHUNK_NODE_TYPE: u8 = 1;

/// `rank` is the dataset's dimensionality (not counting the trailing
/// element-offset slot every chunk key carries).
pub fn traverse(r: &ByteReader, btree_addr: u64, rank: usize) -> Result<Vec<ChunkEntry>> {
    let mut out = Vec::new();
    visit_node(r, btree_addr, rank, &mut out)?;
    Ok(out)
}

fn visit_node(r: &ByteReader, addr: u64, rank: usize, out: &mut Vec<ChunkEntry>) -> Result<()> {
    let mut n = r.at(addr);
    let sig = n.read_bytes(4)?;
    if sig.as_slice() != TREE_SIGNATURE {
        return Err(Hdf5Error::malformed("chunk b-tree node", addr, "signature mismatch, expected \"TREE\""));
    }
    let node_type = n.read_u8()?;
    if node_type != CHUNK_NODE_TYPE {
        return Err(Hdf5Error::malformed("chunk b-tree node", addr, "expected chunk (type 1) b-tree node"));
    }
    let node_level = n.read_u8()?;
    let entries_used = n.read_u16()? as usize;
    let _left_sibling = n.read_offset()?;
    let _right_sibling = n.read_offset()?;

    struct Entry {
        size: u32,
        filter_mask: u32,
        offsets: Vec<u64>,
        child: u64,
    }

    let read_key = |n: &mut ByteReader| -> Result<(u32, u32, Vec<u64>)> {
        let size = n.read_u32()?;
        let filter_mask = n.read_u32()?;
        let mut offsets = Vec::with_capacity(rank);
        for _ in 0..rank {
            offsets.push(n.read_u64()?);
        }
        let _element_offset = n.read_u64()?;
        Ok((size, filter_mask, offsets))
    };

    let mut entries = Vec::with_capacity(entries_used);
    for _ in 0..entries_used {
        let (size, filter_mask, offsets) = read_key(&mut n)?;
        let child = n.read_offset()?;
        entries.push(Entry { size, filter_mask, offsets, child });
    }
    let _trailing_key = read_key(&mut n)?;

    if node_level == 0 {
        for e in entries {
            out.push(ChunkEntry { offset: e.offsets, addr: e.child, size: e.size as u64, filter_mask: e.filter_mask });
        }
    } else {
        for e in entries {
            visit_node(r, e.child, rank, out)?;
        }
    }
    Ok(())
}
