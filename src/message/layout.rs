//! Data layout message (type 0x0008): where a dataset's raw bytes live —
//! inline in the header (compact), as one contiguous run (contiguous), or
//! split across equally-shaped chunks addressed by an index structure
//! (chunked). Versions 1/2 share the legacy encoding; version 3 drops the
//! unused per-class padding; version 4 adds an explicit chunk indexing type
//! so the chunk index's own structure no longer has to be guessed from its
//! signature alone (the index module still confirms by signature, since that
//! is the only reliable way to read versions 1–3).

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkIndexType {
    /// Implied by version < 4, or a dataset with no declared secondary index.
    Unspecified,
    SingleChunk,
    Implicit,
    FixedArray,
    ExtensibleArray,
    BTreeV2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompactLayout {
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContiguousLayout {
    pub addr: u64,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkedLayout {
    pub addr: u64,
    /// Chunk dimensions, dataset-rank length; byte size of a single element
    /// is tracked separately since v4 no longer folds it into this array.
    pub chunk_dims: Vec<u64>,
    pub index_type: ChunkIndexType,
    /// `(filtered_size, filter_mask)` for a version-4 `SingleChunk` index
    /// whose filtered flag is set; the wire format only carries these two
    /// fields in that case, so every other layout leaves this `None`.
    pub single_chunk_filter: Option<(u64, u32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataLayout {
    Compact(CompactLayout),
    Contiguous(ContiguousLayout),
    Chunked(ChunkedLayout),
}

impl DataLayout {
    pub fn read(r: &mut ByteReader) -> Result<Self> {
        let offset = r.position();
        let version = r.read_u8()?;
        match version {
            1 | 2 => Self::read_legacy(r, offset),
            3 => Self::read_v3(r, offset),
            4 => Self::read_v4(r, offset),
            other => Err(Hdf5Error::UnsupportedVersion { structure: "data layout", version: other as u32 }),
        }
    }

    fn read_legacy(r: &mut ByteReader, offset: u64) -> Result<Self> {
        let dimensionality = r.read_u8()? as usize;
        let class = r.read_u8()?;
        r.skip(5); // reserved

        let addr = if class != 0 {
            Some(r.read_offset()?)
        } else {
            None
        };

        let mut dims = Vec::with_capacity(dimensionality);
        for _ in 0..dimensionality {
            dims.push(r.read_u32()? as u64);
        }

        match class {
            0 => {
                let elem_size = r.read_u32()? as usize;
                let data = r.read_bytes(elem_size)?;
                Ok(DataLayout::Compact(CompactLayout { data }))
            }
            1 => {
                let size = dims.iter().product();
                Ok(DataLayout::Contiguous(ContiguousLayout { addr: addr.unwrap(), size }))
            }
            2 => {
                // last dim slot in the legacy encoding is the element byte
                // size, not a spatial chunk extent.
                let chunk_dims = dims[..dims.len().saturating_sub(1)].to_vec();
                Ok(DataLayout::Chunked(ChunkedLayout {
                    addr: addr.unwrap(),
                    chunk_dims,
                    index_type: ChunkIndexType::Unspecified,
                    single_chunk_filter: None,
                }))
            }
            other => Err(Hdf5Error::malformed("data layout", offset, format!("unknown layout class {other}"))),
        }
    }

    fn read_v3(r: &mut ByteReader, offset: u64) -> Result<Self> {
        let class = r.read_u8()?;
        match class {
            0 => {
                let size = r.read_u16()? as usize;
                let data = r.read_bytes(size)?;
                Ok(DataLayout::Compact(CompactLayout { data }))
            }
            1 => {
                let addr = r.read_offset()?;
                let size = r.read_length()?;
                Ok(DataLayout::Contiguous(ContiguousLayout { addr, size }))
            }
            2 => {
                let dimensionality = r.read_u8()? as usize;
                let addr = r.read_offset()?;
                let mut dims = Vec::with_capacity(dimensionality);
                for _ in 0..dimensionality {
                    dims.push(r.read_u32()? as u64);
                }
                let chunk_dims = dims[..dims.len().saturating_sub(1)].to_vec();
                Ok(DataLayout::Chunked(ChunkedLayout { addr, chunk_dims, index_type: ChunkIndexType::Unspecified, single_chunk_filter: None }))
            }
            other => Err(Hdf5Error::malformed("data layout", offset, format!("unknown layout class {other}"))),
        }
    }

    fn read_v4(r: &mut ByteReader, offset: u64) -> Result<Self> {
        let class = r.read_u8()?;
        match class {
            0 => {
                let size = r.read_u16()? as usize;
                let data = r.read_bytes(size)?;
                Ok(DataLayout::Compact(CompactLayout { data }))
            }
            1 => {
                let addr = r.read_offset()?;
                let size = r.read_length()?;
                Ok(DataLayout::Contiguous(ContiguousLayout { addr, size }))
            }
            2 => {
                let flags = r.read_u8()?;
                let dimensionality = r.read_u8()? as usize;
                let dim_size_width = r.read_u8()?;
                let mut chunk_dims = Vec::with_capacity(dimensionality);
                for _ in 0..dimensionality {
                    chunk_dims.push(r.read_uint(dim_size_width)?);
                }
                let index_type_byte = r.read_u8()?;
                let index_type = match index_type_byte {
                    1 => ChunkIndexType::SingleChunk,
                    2 => ChunkIndexType::Implicit,
                    3 => ChunkIndexType::FixedArray,
                    4 => ChunkIndexType::ExtensibleArray,
                    5 => ChunkIndexType::BTreeV2,
                    other => return Err(Hdf5Error::malformed("data layout", offset, format!("unknown chunk index type {other}"))),
                };

                let filtered = flags & 0x02 != 0;
                let mut single_chunk_filter = None;
                let addr = match index_type {
                    ChunkIndexType::SingleChunk => {
                        if filtered {
                            let filtered_size = r.read_length()?;
                            let filter_mask = r.read_u32()?;
                            single_chunk_filter = Some((filtered_size, filter_mask));
                        }
                        // A single-chunk layout stores its one chunk inline
                        // at the address that follows these optional fields.
                        r.read_offset()?
                    }
                    ChunkIndexType::Implicit => r.read_offset()?,
                    ChunkIndexType::FixedArray => {
                        let _page_bits = r.read_u8()?;
                        r.read_offset()?
                    }
                    ChunkIndexType::ExtensibleArray => {
                        let _max_bits = r.read_u8()?;
                        let _index_elements = r.read_u8()?;
                        let _min_pointer = r.read_u8()?;
                        let _min_elements = r.read_u8()?;
                        let _page_bits = r.read_u8()?;
                        r.read_offset()?
                    }
                    ChunkIndexType::BTreeV2 => {
                        let _node_size = r.read_u32()?;
                        let _split_percent = r.read_u8()?;
                        let _merge_percent = r.read_u8()?;
                        r.read_offset()?
                    }
                    ChunkIndexType::Unspecified => {
                        return Err(Hdf5Error::malformed("data layout", offset, "index type unspecified in version 4"));
                    }
                };

                Ok(DataLayout::Chunked(ChunkedLayout { addr, chunk_dims, index_type, single_chunk_filter }))
            }
            other => Err(Hdf5Error::malformed("data layout", offset, format!("unknown layout class {other}"))),
        }
    }
}
