//! Symbol table message (type 0x0011): the legacy (pre-link-message) way a
//! group records its children — a B-tree v1 of group nodes plus the local
//! heap holding their names.

use crate::error::Result;
use crate::reader::ByteReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolTableMsg {
    pub btree_addr: u64,
    pub local_heap_addr: u64,
}

impl SymbolTableMsg {
    pub fn read(r: &mut ByteReader) -> Result<Self> {
        let btree_addr = r.read_offset()?;
        let local_heap_addr = r.read_offset()?;
        Ok(SymbolTableMsg { btree_addr, local_heap_addr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::reader::ByteSource;

    #[test]
    fn reads_two_addresses() {
        let mut b = Vec::new();
        b.extend_from_slice(&10u64.to_le_bytes());
        b.extend_from_slice(&20u64.to_le_bytes());
        let mut r = ByteReader::new(Arc::new(b) as Arc<dyn ByteSource>, 8, 8);
        let msg = SymbolTableMsg::read(&mut r).unwrap();
        assert_eq!(msg.btree_addr, 10);
        assert_eq!(msg.local_heap_addr, 20);
    }
}
