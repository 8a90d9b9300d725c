//! Chunked layout: the dataset is split into equally shaped chunks, each
//! independently filtered and stored at an address given by a chunk index.
//! Chunks straddling the dataset's edge are stored at full chunk size but
//! only their `min(chunk_dims[d], dims[d] - chunk_offset[d])` prefix along
//! each dimension holds real data — the rest is filler that must never be
//! copied into a caller's buffer.

use crate::btree::chunk_index;
use crate::error::{Hdf5Error, Result};
use crate::filter::Pipeline;
use crate::message::layout::ChunkIndexType;
use crate::message::FilterPipelineMsg;
use crate::reader::ByteReader;

use super::{element_count, row_major_strides, Layout};

pub struct ChunkedLayout<'a> {
    reader: ByteReader,
    index_addr: u64,
    chunk_dims: Vec<u64>,
    index_type: ChunkIndexType,
    dims: Vec<u64>,
    element_size: u64,
    filters: Option<&'a FilterPipelineMsg>,
    /// `(filtered_size, filter_mask)` carried inline by a filtered v4
    /// `SingleChunk` layout; `None` for every other layout, and for an
    /// unfiltered `SingleChunk` layout (which has no explicit size on disk).
    single_chunk_filter: Option<(u64, u32)>,
}

impl<'a> ChunkedLayout<'a> {
    pub fn new(
        reader: ByteReader,
        index_addr: u64,
        chunk_dims: Vec<u64>,
        index_type: ChunkIndexType,
        dims: Vec<u64>,
        element_size: u64,
        filters: Option<&'a FilterPipelineMsg>,
        single_chunk_filter: Option<(u64, u32)>,
    ) -> Self {
        ChunkedLayout { reader, index_addr, chunk_dims, index_type, dims, element_size, filters, single_chunk_filter }
    }

    fn chunk_byte_size(&self) -> u64 {
        self.chunk_dims.iter().product::<u64>() * self.element_size
    }

    fn decode_chunk_bytes(&self, stored: &[u8], filter_mask: u32) -> Result<Vec<u8>> {
        match self.filters {
            Some(msg) if !msg.filters.is_empty() => {
                let pipeline = Pipeline::new(msg);
                let (decoded, _warnings) = pipeline.decode_chunk(stored, filter_mask, self.element_size as usize)?;
                Ok(decoded)
            }
            _ => Ok(stored.to_vec()),
        }
    }

    /// Copy the valid (non-edge-filler) portion of one decoded chunk into
    /// `out`, restricted further to the requested `[start, start+count)`
    /// hyperslab.
    fn scatter_chunk(
        &self,
        out: &mut [u8],
        out_dims: &[u64],
        sel_start: &[u64],
        chunk_offset: &[u64],
        chunk_data: &[u8],
    ) -> Result<()> {
        let rank = self.dims.len();
        let actual_chunk_dims: Vec<u64> =
            (0..rank).map(|d| self.chunk_dims[d].min(self.dims[d] - chunk_offset[d])).collect();

        // Intersect the chunk's valid region with the requested selection.
        let mut lo = vec![0u64; rank];
        let mut hi = vec![0u64; rank];
        for d in 0..rank {
            let chunk_lo = chunk_offset[d];
            let chunk_hi = chunk_offset[d] + actual_chunk_dims[d];
            let sel_lo = sel_start[d];
            let sel_hi = sel_start[d] + out_dims[d];
            lo[d] = chunk_lo.max(sel_lo);
            hi[d] = chunk_hi.min(sel_hi);
            if lo[d] >= hi[d] {
                return Ok(()); // no overlap on this dimension
            }
        }

        let chunk_strides = row_major_strides(&self.chunk_dims);
        let out_strides = row_major_strides(out_dims);
        let span: Vec<u64> = (0..rank).map(|d| hi[d] - lo[d]).collect();
        let total: u64 = span.iter().product();

        let mut coord = vec![0u64; rank];
        for linear in 0..total {
            let mut idx = linear;
            for d in (0..rank).rev() {
                let extent = span[d].max(1);
                coord[d] = lo[d] + idx % extent;
                idx /= extent;
            }

            let chunk_local: Vec<u64> = (0..rank).map(|d| coord[d] - chunk_offset[d]).collect();
            let src_elem: u64 = chunk_local.iter().zip(&chunk_strides).map(|(c, s)| c * s).sum();
            let dst_elem: u64 = (0..rank).map(|d| (coord[d] - sel_start[d]) * out_strides[d]).sum();

            let n = self.element_size as usize;
            let src = (src_elem * self.element_size) as usize;
            let dst = (dst_elem * self.element_size) as usize;
            out[dst..dst + n].copy_from_slice(&chunk_data[src..src + n]);
        }
        Ok(())
    }
}

impl<'a> Layout for ChunkedLayout<'a> {
    fn read_all(&self) -> Result<Vec<u8>> {
        let zero_start = vec![0u64; self.dims.len()];
        self.read_hyperslab(&zero_start, &self.dims)
    }

    fn read_hyperslab(&self, start: &[u64], count: &[u64]) -> Result<Vec<u8>> {
        let rank = self.dims.len();
        if start.len() != rank || count.len() != rank {
            return Err(Hdf5Error::OutOfBounds(format!("hyperslab rank {} does not match dataset rank {rank}", start.len())));
        }
        for d in 0..rank {
            if start[d] + count[d] > self.dims[d] {
                return Err(Hdf5Error::OutOfBounds(format!(
                    "hyperslab [{}, {}) exceeds dimension {d} extent {}",
                    start[d],
                    start[d] + count[d],
                    self.dims[d]
                )));
            }
        }

        let entries = chunk_index::read_chunk_entries(
            &self.reader,
            self.index_addr,
            self.index_type,
            &self.dims,
            &self.chunk_dims,
            self.element_size,
            self.filters.map(|f| !f.filters.is_empty()).unwrap_or(false),
            self.single_chunk_filter,
        )?;

        let out_count = element_count(count) as usize;
        let mut out = vec![0u8; out_count * self.element_size as usize];

        for entry in &entries {
            if !entry.overlaps(start, count, &self.chunk_dims) {
                continue;
            }
            let full_size = self.chunk_byte_size();
            let read_size = if entry.size > 0 { entry.size } else { full_size };
            let stored = self.reader.at(entry.addr).read_bytes(read_size as usize)?;
            let decoded = self.decode_chunk_bytes(&stored, entry.filter_mask)?;
            self.scatter_chunk(&mut out, count, start, &entry.offset, &decoded)?;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::btree::ChunkEntry;
    use crate::reader::ByteSource;

    fn reader(bytes: Vec<u8>) -> ByteReader {
        ByteReader::new(Arc::new(bytes) as Arc<dyn ByteSource>, 8, 8)
    }

    #[test]
    fn scatter_chunk_respects_edge_clipping() {
        // dataset 5 wide, chunk size 3 -> second chunk only has 2 valid
        // elements (offset 3, 4) even though it's stored at full width 3.
        let dims = vec![5u64];
        let chunk_dims = vec![3u64];
        let layout = ChunkedLayout::new(reader(vec![]), 0, chunk_dims, ChunkIndexType::Unspecified, dims, 1, None, None);

        let chunk_data = vec![30, 40, 0xAA]; // last byte is edge filler, must not be copied
        let mut out = vec![0u8; 5];
        layout.scatter_chunk(&mut out, &[5], &[0], &[3], &chunk_data).unwrap();
        assert_eq!(&out[3..5], &[30, 40]);
        assert_eq!(out[2], 0); // untouched by this chunk
    }

    #[test]
    fn read_all_assembles_full_dataset_from_entries_via_index() {
        // Build a tiny implicit-indexed dataset: 4 elements, chunk size 2.
        let data = vec![1u8, 2, 3, 4];
        let dims = vec![4u64];
        let chunk_dims = vec![2u64];
        let r = reader(data.clone());
        let layout = ChunkedLayout::new(r, 0, chunk_dims, ChunkIndexType::Implicit, dims, 1, None, None);
        let all = layout.read_all().unwrap();
        assert_eq!(all, data);
    }

    #[test]
    fn filtered_single_chunk_uses_stored_size_not_chunk_byte_size() {
        use std::io::Write;
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use crate::message::filter_pipeline::{FilterDescription, FilterPipelineMsg, FILTER_DEFLATE};

        let original = vec![1u8, 2, 3, 4];
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&original).unwrap();
        let compressed = encoder.finish().unwrap();
        assert!(compressed.len() != original.len(), "fixture should actually compress/reframe the data");

        let dims = vec![4u64];
        let chunk_dims = vec![4u64];
        let filters = FilterPipelineMsg { version: 2, filters: vec![FilterDescription { id: FILTER_DEFLATE, name: String::new(), optional: false, client_data: vec![] }] };

        let layout = ChunkedLayout::new(
            reader(compressed.clone()),
            0,
            chunk_dims,
            ChunkIndexType::SingleChunk,
            dims,
            1,
            Some(&filters),
            Some((compressed.len() as u64, 0)),
        );

        // If the stored size were ignored in favor of chunk_byte_size() (4,
        // the uncompressed size), this read would pull in trailing garbage
        // or fail outright since the compressed buffer is shorter than 4.
        let out = layout.read_all().unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn chunk_entry_overlap_detects_disjoint_ranges() {
        let entry = ChunkEntry { offset: vec![0], addr: 0, size: 0, filter_mask: 0 };
        assert!(entry.overlaps(&[0], &[2], &[4]));
        assert!(!entry.overlaps(&[4], &[2], &[4]));
    }
}
