//! B-tree v1 group nodes ("TREE") and the symbol table nodes ("SNOD") they
//! index: the legacy way a group's children are enumerated before the
//! link-message/fractal-heap scheme.

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

const TREE_SIGNATURE: &[u8; 4] = b"TREE";
const SNOD_SIGNATURE: &[u8; 4] = b"SNOD";
const GROUP_NODE_TYPE: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolTableEntry {
    pub link_name_offset: u64,
    pub object_header_addr: u64,
    pub cache_type: u32,
}

fn read_snod(r: &ByteReader, addr: u64) -> Result<Vec<SymbolTableEntry>> {
    let mut n = r.at(addr);
    let sig = n.read_bytes(4)?;
    if sig.as_slice() != SNOD_SIGNATURE {
        return Err(Hdf5Error::malformed("symbol table node", addr, "signature mismatch, expected \"SNOD\""));
    }
    let version = n.read_u8()?;
    if version != 1 {
        return Err(Hdf5Error::UnsupportedVersion { structure: "symbol table node", version: version as u32 });
    }
    n.skip(1); // reserved
    let num_symbols = n.read_u16()? as usize;

    let mut entries = Vec::with_capacity(num_symbols);
    for _ in 0..num_symbols {
        let link_name_offset = n.read_offset()?;
        let object_header_addr = n.read_offset()?;
        let cache_type = n.read_u32()?;
        n.skip(4); // reserved
        n.skip(16); // scratch-pad, interpreted only for cache_type 2 (symlinks)
        entries.push(SymbolTableEntry { link_name_offset, object_header_addr, cache_type });
    }
    Ok(entries)
}

/// In-order traversal of the group B-tree rooted at `btree_addr`, returning
/// every symbol table entry across all leaf (SNOD) nodes.
pub fn traverse(r: &ByteReader, btree_addr: u64) -> Result<Vec<SymbolTableEntry>> {
    let mut out = Vec::new();
    visit_node(r, btree_addr, &mut out)?;
    Ok(out)
}

fn visit_node(r: &ByteReader, addr: u64, out: &mut Vec<SymbolTableEntry>) -> Result<()> {
    let mut n = r.at(addr);
    let sig = n.read_bytes(4)?;
    if sig.as_slice() != TREE_SIGNATURE {
        return Err(Hdf5Error::malformed("group b-tree node", addr, "signature mismatch, expected \"TREE\""));
    }
    let node_type = n.read_u8()?;
    if node_type != GROUP_NODE_TYPE {
        return Err(Hdf5Error::malformed("group b-tree node", addr, "expected group (type 0) b-tree node"));
    }
    let node_level = n.read_u8()?;
    let entries_used = n.read_u16()? as usize;
    let _left_sibling = n.read_offset()?;
    let _right_sibling = n.read_offset()?;

    // Layout: key0, child0, key1, child1, ..., key_n, child_n
    let mut children = Vec::with_capacity(entries_used);
    for _ in 0..entries_used {
        let _key = n.read_length()?;
        let child_addr = n.read_offset()?;
        children.push(child_addr);
    }
    let _trailing_key = n.read_length()?;

    if node_level == 0 {
        for child in children {
            out.extend(read_snod(r, child)?);
        }
    } else {
        for child in children {
            visit_node(r, child, out)?;
        }
    }
    Ok(())
}
