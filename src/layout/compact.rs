//! Compact layout: the dataset's entire contents are inlined directly in
//! its data layout message, so reading is just a slice of bytes already
//! resident in memory.

use crate::error::{Hdf5Error, Result};

use super::{element_count, row_major_strides, Layout};

pub struct CompactLayout {
    data: Vec<u8>,
    dims: Vec<u64>,
    element_size: u64,
}

impl CompactLayout {
    pub fn new(data: Vec<u8>, dims: Vec<u64>, element_size: u64) -> Self {
        CompactLayout { data, dims, element_size }
    }
}

impl Layout for CompactLayout {
    fn read_all(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }

    fn read_hyperslab(&self, start: &[u64], count: &[u64]) -> Result<Vec<u8>> {
        if start.len() != self.dims.len() || count.len() != self.dims.len() {
            return Err(Hdf5Error::OutOfBounds(format!(
                "hyperslab rank {} does not match dataset rank {}",
                start.len(),
                self.dims.len()
            )));
        }
        for d in 0..self.dims.len() {
            if start[d] + count[d] > self.dims[d] {
                return Err(Hdf5Error::OutOfBounds(format!(
                    "hyperslab [{}, {}) exceeds dimension {d} extent {}",
                    start[d],
                    start[d] + count[d],
                    self.dims[d]
                )));
            }
        }

        let strides = row_major_strides(&self.dims);
        let out_strides = row_major_strides(count);
        let out_count = element_count(count) as usize;
        let mut out = vec![0u8; out_count * self.element_size as usize];

        let mut indices = vec![0u64; self.dims.len()];
        for linear in 0..out_count {
            let mut rem = linear as u64;
            for d in 0..self.dims.len() {
                indices[d] = start[d] + rem / out_strides[d];
                rem %= out_strides[d];
            }
            let src_offset: u64 = indices.iter().zip(&strides).map(|(i, s)| i * s).sum::<u64>() * self.element_size;
            let dst_offset = linear * self.element_size as usize;
            let n = self.element_size as usize;
            out[dst_offset..dst_offset + n].copy_from_slice(&self.data[src_offset as usize..src_offset as usize + n]);
        }
        Ok(out)
    }
}
