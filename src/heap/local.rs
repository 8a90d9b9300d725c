//! Local heap — per-group linear byte block storing NUL-terminated link
//! names, addressed by a symbol-table entry's `link_name_offset`.

use std::sync::Arc;

use crate::error::{Hdf5Error, Result};
use crate::reader::{ByteReader, ByteSource};

const SIGNATURE: &[u8; 4] = b"HEAP";

#[derive(Debug, Clone)]
pub struct LocalHeap {
    pub data_size: u64,
    pub free_list_offset: u64,
    pub data_addr: u64,
    data: Vec<u8>,
}

impl LocalHeap {
    pub fn read(r: &ByteReader, addr: u64) -> Result<Self> {
        let mut r = r.at(addr);

        let sig = r.read_bytes(4)?;
        if sig.as_slice() != SIGNATURE {
            return Err(Hdf5Error::malformed("local heap", addr, "signature mismatch, expected \"HEAP\""));
        }
        let version = r.read_u8()?;
        if version != 0 {
            return Err(Hdf5Error::UnsupportedVersion { structure: "local heap", version: version as u32 });
        }
        r.skip(3); // reserved

        let data_size = r.read_length()?;
        let free_list_offset = r.read_length()?;
        let data_addr = r.read_offset()?;

        let data = r.at(data_addr).read_bytes(data_size as usize)?;

        Ok(LocalHeap { data_size, free_list_offset, data_addr, data })
    }

    /// Return the NUL-terminated string starting at `offset` within the
    /// heap's data segment. Out-of-range offsets return an empty string.
    pub fn name_at(&self, offset: u64) -> String {
        let offset = offset as usize;
        if offset >= self.data.len() {
            return String::new();
        }
        let slice = &self.data[offset..];
        let end = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());
        String::from_utf8_lossy(&slice[..end]).into_owned()
    }

    pub fn raw(&self) -> &[u8] { &self.data }

    #[cfg(test)]
    fn source_bytes(
        data_size: u64,
        free_list_offset: u64,
        data_addr: u64,
        data: &[u8],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(SIGNATURE);
        buf.push(0);
        buf.extend_from_slice(&[0, 0, 0]);
        buf.extend_from_slice(&data_size.to_le_bytes());
        buf.extend_from_slice(&free_list_offset.to_le_bytes());
        buf.extend_from_slice(&data_addr.to_le_bytes());
        while buf.len() < data_addr as usize {
            buf.push(0);
        }
        buf.extend_from_slice(data);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(bytes: Vec<u8>) -> ByteReader {
        ByteReader::new(Arc::new(bytes) as Arc<dyn ByteSource>, 8, 8)
    }

    #[test]
    fn name_lookup_finds_nul_terminator() {
        let data = b"alpha\0beta\0gamma\0";
        let bytes = LocalHeap::source_bytes(data.len() as u64, 0, 32, data);
        let r = reader(bytes);
        let heap = LocalHeap::read(&r, 0).unwrap();
        assert_eq!(heap.name_at(0), "alpha");
        assert_eq!(heap.name_at(6), "beta");
        assert_eq!(heap.name_at(11), "gamma");
    }

    #[test]
    fn name_lookup_without_trailing_nul_reads_to_end() {
        let data = b"noterm";
        let bytes = LocalHeap::source_bytes(data.len() as u64, 0, 32, data);
        let r = reader(bytes);
        let heap = LocalHeap::read(&r, 0).unwrap();
        assert_eq!(heap.name_at(0), "noterm");
    }

    #[test]
    fn out_of_range_offset_returns_empty() {
        let data = b"short";
        let bytes = LocalHeap::source_bytes(data.len() as u64, 0, 32, data);
        let r = reader(bytes);
        let heap = LocalHeap::read(&r, 0).unwrap();
        assert_eq!(heap.name_at(9999), "");
    }

    #[test]
    fn bad_signature_is_malformed() {
        let mut bytes = LocalHeap::source_bytes(4, 0, 32, b"abcd");
        bytes[0] = b'X';
        let r = reader(bytes);
        let err = LocalHeap::read(&r, 0).unwrap_err();
        assert!(matches!(err, Hdf5Error::Malformed { structure: "local heap", .. }));
    }
}
