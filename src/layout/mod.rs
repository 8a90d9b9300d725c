//! Dataset storage layouts: compact (inline in the object header), contiguous
//! (one run of bytes), and chunked (independently filtered, fixed-shape
//! blocks addressed by one of the chunk index structures in [`crate::btree`]).

pub mod chunked;
pub mod compact;
pub mod contiguous;

use crate::error::Result;
use crate::message::{DataLayout, Datatype, FilterPipelineMsg};
use crate::reader::ByteReader;

/// A read-only view over one dataset's stored bytes, abstracting over the
/// three storage layouts. `read_all` and `read_hyperslab` both return the
/// dataset's natural row-major byte layout regardless of how it is stored
/// on disk.
pub trait Layout {
    fn read_all(&self) -> Result<Vec<u8>>;

    /// Read the hyperslab starting at `start` (dataset-space coordinates)
    /// spanning `count` elements per dimension.
    fn read_hyperslab(&self, start: &[u64], count: &[u64]) -> Result<Vec<u8>>;
}

pub fn build<'a>(
    reader: &'a ByteReader,
    layout: &'a DataLayout,
    dims: &'a [u64],
    datatype: &'a Datatype,
    filters: Option<&'a FilterPipelineMsg>,
) -> Box<dyn Layout + 'a> {
    match layout {
        DataLayout::Compact(c) => Box::new(compact::CompactLayout::new(c.data.clone(), dims.to_vec(), datatype.byte_size() as u64)),
        DataLayout::Contiguous(c) => {
            Box::new(contiguous::ContiguousLayout::new(reader.clone(), c.addr, dims.to_vec(), datatype.byte_size() as u64))
        }
        DataLayout::Chunked(c) => Box::new(chunked::ChunkedLayout::new(
            reader.clone(),
            c.addr,
            c.chunk_dims.clone(),
            c.index_type,
            dims.to_vec(),
            datatype.byte_size() as u64,
            filters,
            c.single_chunk_filter,
        )),
    }
}

/// Number of elements described by `dims`.
pub fn element_count(dims: &[u64]) -> u64 {
    dims.iter().product()
}

/// Row-major strides for `dims`: `strides[d]` is the number of elements
/// between consecutive indices along dimension `d`.
pub fn row_major_strides(dims: &[u64]) -> Vec<u64> {
    let mut strides = vec![1u64; dims.len()];
    for d in (0..dims.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * dims[d + 1];
    }
    strides
}
