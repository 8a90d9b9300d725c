//! Index structures: B-tree v1 (group children, and the original chunk
//! index), B-tree v2 (growable-along-many-dimensions chunk index), fixed
//! array (fixed-extent chunk index), and extensible array (growable along
//! one dimension).

pub mod chunk_index;
pub mod chunk_v1;
pub mod chunk_v2;
pub mod extensible_array;
pub mod fixed_array;
pub mod group;

pub use group::SymbolTableEntry;

/// One chunk's location in the file and its starting coordinate in the
/// dataset, shared by every chunk index implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    pub offset: Vec<u64>,
    pub addr: u64,
    /// Stored (possibly filtered) byte size. Zero when the index does not
    /// record it (single-chunk and implicit layouts use the full,
    /// unfiltered chunk size instead).
    pub size: u64,
    pub filter_mask: u32,
}

impl ChunkEntry {
    /// True if `point` (dataset-space coordinates) falls within this
    /// chunk's extent.
    pub fn contains(&self, point: &[u64], chunk_dims: &[u64]) -> bool {
        self.offset.iter().zip(point).zip(chunk_dims).all(|((&start, &p), &extent)| p >= start && p < start + extent)
    }

    /// True if this chunk's box overlaps the half-open hyperslab
    /// `[start, start + count)`.
    pub fn overlaps(&self, start: &[u64], count: &[u64], chunk_dims: &[u64]) -> bool {
        self.offset.iter().enumerate().all(|(d, &chunk_start)| {
            let chunk_end = chunk_start + chunk_dims[d];
            let sel_start = start[d];
            let sel_end = start[d] + count[d];
            chunk_start < sel_end && sel_start < chunk_end
        })
    }
}
