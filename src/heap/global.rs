//! Global heap — an indexed collection of variable-sized objects, used for
//! variable-length datatype payloads. Addressed by a [`GlobalHeapId`]
//! (collection address, object index).

use std::collections::HashMap;

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

const SIGNATURE: &[u8; 4] = b"GCOL";

/// A reference to an object stored in a global heap collection, as embedded
/// in variable-length message payloads: an `offset`-sized collection
/// address followed by a 4-byte object index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalHeapId {
    pub collection_addr: u64,
    pub object_index: u32,
}

impl GlobalHeapId {
    pub fn read(r: &mut ByteReader) -> Result<Self> {
        let collection_addr = r.read_offset()?;
        let object_index = r.read_u32()?;
        Ok(GlobalHeapId { collection_addr, object_index })
    }
}

#[derive(Debug, Clone)]
pub struct GlobalHeap {
    pub collection_size: u64,
    objects: HashMap<u32, Vec<u8>>,
}

impl GlobalHeap {
    pub fn read(r: &ByteReader, addr: u64) -> Result<Self> {
        let mut r = r.at(addr);

        let sig = r.read_bytes(4)?;
        if sig.as_slice() != SIGNATURE {
            return Err(Hdf5Error::malformed("global heap", addr, "signature mismatch, expected \"GCOL\""));
        }
        let version = r.read_u8()?;
        if version != 1 {
            return Err(Hdf5Error::UnsupportedVersion { structure: "global heap", version: version as u32 });
        }
        r.skip(3); // reserved
        let collection_size = r.read_length()?;

        let mut objects = HashMap::new();
        // The collection occupies exactly `collection_size` bytes starting
        // at the collection signature; stop once we run past it or hit the
        // index-0 terminator.
        let end = addr + collection_size;
        loop {
            if r.position() + 8 > end {
                break;
            }
            let index = r.read_u16()?;
            if index == 0 {
                break;
            }
            let _ref_count = r.read_u16()?;
            r.skip(4); // reserved
            let object_size = r.read_length()?;
            let bytes = r.read_bytes(object_size as usize)?;
            objects.insert(index as u32, bytes);
            r.align(8);
        }

        Ok(GlobalHeap { collection_size, objects })
    }

    /// A copy of the stored bytes for `index`, so callers cannot mutate the
    /// cached collection.
    pub fn object(&self, index: u32) -> Option<Vec<u8>> {
        self.objects.get(&index).cloned()
    }

    /// The prefix of the object's bytes up to the first NUL, decoded as a
    /// string. A convenience for variable-length string payloads.
    pub fn object_as_string(&self, index: u32) -> Option<String> {
        let bytes = self.objects.get(&index)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}
