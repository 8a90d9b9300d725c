//! Extensible array chunk index ("EAHD" header, "EAIB" index block): used
//! when a dataset's extent can grow along exactly one dimension. Only the
//! index block's own inline element slots are walked. Once the element
//! count exceeds what the index block holds directly, the real format
//! spills into secondary and data blocks reached through super-block and
//! data-block pointer tables whose element-to-block mapping this decoder
//! does not derive from first principles; such a dataset is reported as an
//! unsupported feature instead of silently returning a truncated chunk list.

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

use super::ChunkEntry;

const HEADER_SIGNATURE: &[u8; 4] = b"EAHD";
const INDEX_BLOCK_SIGNATURE: &[u8; 4] = b"EAIB";

pub fn traverse(r: &ByteReader, header_addr: u64, chunk_dims: &[u64], filtered: bool) -> Result<Vec<ChunkEntry>> {
    let mut h = r.at(header_addr);
    let sig = h.read_bytes(4)?;
    if sig.as_slice() != HEADER_SIGNATURE {
        return Err(Hdf5Error::malformed("extensible array header", header_addr, "signature mismatch, expected \"EAHD\""));
    }
    let version = h.read_u8()?;
    if version != 0 {
        return Err(Hdf5Error::UnsupportedVersion { structure: "extensible array header", version: version as u32 });
    }
    let _client_id = h.read_u8()?;
    let _element_size = h.read_u8()?;
    let _max_nelmts_bits = h.read_u8()?;
    let index_block_elements = h.read_u8()? as u64;
    let _data_blk_min_elmts = h.read_u8()?;
    let _secondary_blk_min_dblk_ptrs = h.read_u8()?;
    let _max_dblk_page_nelmts_bits = h.read_u8()?;
    let num_elements = h.read_length()?;
    let index_block_addr = h.read_offset()?;

    if num_elements > index_block_elements {
        return Err(Hdf5Error::unsupported_feature(
            "extensible array",
            format!("{num_elements} elements exceed the {index_block_elements} held inline in the index block"),
        ));
    }

    let mut b = r.at(index_block_addr);
    let sig = b.read_bytes(4)?;
    if sig.as_slice() != INDEX_BLOCK_SIGNATURE {
        return Err(Hdf5Error::malformed("extensible array index block", index_block_addr, "signature mismatch, expected \"EAIB\""));
    }
    let ib_version = b.read_u8()?;
    if ib_version != 0 {
        return Err(Hdf5Error::UnsupportedVersion { structure: "extensible array index block", version: ib_version as u32 });
    }
    let _client_id = b.read_u8()?;
    let _header_addr_back = b.read_offset()?;

    let mut out = Vec::with_capacity(num_elements as usize);
    for linear_index in 0..num_elements {
        let addr = b.read_offset()?;
        let (size, filter_mask) = if filtered {
            let size = b.read_length()?;
            let mask = b.read_u32()?;
            (size, mask)
        } else {
            (0, 0)
        };
        if b.is_undefined_offset(addr) {
            continue;
        }
        // Single growable dimension: linear index times the (single) chunk
        // extent gives that dimension's starting coordinate directly.
        let offset = vec![linear_index * chunk_dims.first().copied().unwrap_or(1)];
        out.push(ChunkEntry { offset, addr, size, filter_mask });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::reader::ByteSource;

    fn reader(bytes: Vec<u8>) -> ByteReader {
        ByteReader::new(Arc::new(bytes) as Arc<dyn ByteSource>, 8, 8)
    }

    #[test]
    fn inline_elements_are_read_directly() {
        let mut index_block = Vec::new();
        index_block.extend_from_slice(INDEX_BLOCK_SIGNATURE);
        index_block.push(0);
        index_block.push(0);
        index_block.extend_from_slice(&0u64.to_le_bytes());
        index_block.extend_from_slice(&111u64.to_le_bytes());
        index_block.extend_from_slice(&222u64.to_le_bytes());

        let ib_addr = 64u64;
        let mut header = Vec::new();
        header.extend_from_slice(HEADER_SIGNATURE);
        header.push(0);
        header.push(0); // client id
        header.push(8); // element size
        header.push(32); // max nelmts bits
        header.push(4); // index block elements
        header.push(4); // data blk min elmts
        header.push(2); // secondary blk min dblk ptrs
        header.push(0); // max dblk page nelmts bits
        header.extend_from_slice(&2u64.to_le_bytes()); // num elements
        header.extend_from_slice(&ib_addr.to_le_bytes());

        let mut bytes = header;
        bytes.resize(ib_addr as usize, 0);
        bytes.extend_from_slice(&index_block);

        let r = reader(bytes);
        let chunks = traverse(&r, 0, &[5], false).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].addr, 111);
        assert_eq!(chunks[0].offset, vec![0]);
        assert_eq!(chunks[1].addr, 222);
        assert_eq!(chunks[1].offset, vec![5]);
    }

    #[test]
    fn overflow_beyond_index_block_is_unsupported() {
        let mut header = Vec::new();
        header.extend_from_slice(HEADER_SIGNATURE);
        header.push(0);
        header.push(0);
        header.push(8);
        header.push(32);
        header.push(2); // index block holds only 2
        header.push(4);
        header.push(2);
        header.push(0);
        header.extend_from_slice(&5u64.to_le_bytes()); // but 5 elements total
        header.extend_from_slice(&64u64.to_le_bytes());

        let r = reader(header);
        let err = traverse(&r, 0, &[5], false).unwrap_err();
        assert!(matches!(err, Hdf5Error::UnsupportedFeature { .. }));
    }
}
