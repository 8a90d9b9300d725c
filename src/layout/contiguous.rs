//! Contiguous layout: the dataset occupies one unbroken run of bytes at a
//! fixed address, in row-major order. A full-extent read is a single
//! positional read; a hyperslab either fast-paths to one read per
//! contiguous row or falls back to a full read plus in-memory extraction
//! when rows aren't contiguous in the selection.

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

use super::{element_count, row_major_strides, Layout};

pub struct ContiguousLayout {
    reader: ByteReader,
    addr: u64,
    dims: Vec<u64>,
    element_size: u64,
}

impl ContiguousLayout {
    pub fn new(reader: ByteReader, addr: u64, dims: Vec<u64>, element_size: u64) -> Self {
        ContiguousLayout { reader, addr, dims, element_size }
    }
}

impl Layout for ContiguousLayout {
    fn read_all(&self) -> Result<Vec<u8>> {
        let total = element_count(&self.dims) * self.element_size;
        Ok(self.reader.at(self.addr).read_bytes(total as usize)?)
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

        // Fast path: selecting the full extent in every dimension but the
        // first is a single contiguous run.
        let full_tail = self.dims.len() <= 1 || (1..self.dims.len()).all(|d| start[d] == 0 && count[d] == self.dims[d]);
        if full_tail {
            let strides = row_major_strides(&self.dims);
            let row_elems: u64 = if self.dims.is_empty() { 1 } else { strides[0] };
            let offset = start.first().copied().unwrap_or(0) * row_elems * self.element_size;
            let len = count.first().copied().unwrap_or(1) * row_elems * self.element_size;
            return Ok(self.reader.at(self.addr + offset).read_bytes(len as usize)?);
        }

        // General case: read the whole dataset and extract in memory. A
        // dataset large enough to make this painful would typically be
        // stored chunked rather than contiguous.
        let all = self.read_all()?;
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
            out[dst_offset..dst_offset + n].copy_from_slice(&all[src_offset as usize..src_offset as usize + n]);
        }
        Ok(out)
    }
}
