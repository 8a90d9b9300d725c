//! Object header messages: the typed records that make up an object
//! header's body. Each message is encoded as a 2-byte type code, a 2-byte
//! payload size, a flags byte, then `size` bytes of type-specific payload.
//! Types this decoder does not need to interpret (fill value, group info,
//! shared message table, object comment, and the rest) are preserved
//! opaquely rather than rejected, since skipping an object's unreferenced
//! messages must never block reading the messages that are referenced.

pub mod attribute;
pub mod dataspace;
pub mod datatype;
pub mod filter_pipeline;
pub mod layout;
pub mod link;
pub mod symbol_table;

pub use attribute::AttributeMsg;
pub use dataspace::Dataspace;
pub use datatype::Datatype;
pub use filter_pipeline::FilterPipelineMsg;
pub use layout::DataLayout;
pub use link::LinkMsg;
pub use symbol_table::SymbolTableMsg;

use std::sync::Arc;

use crate::error::Result;
use crate::reader::{ByteReader, ByteSource};

pub const TYPE_DATASPACE: u16 = 0x0001;
pub const TYPE_LINK_INFO: u16 = 0x0002;
pub const TYPE_DATATYPE: u16 = 0x0003;
pub const TYPE_FILL_VALUE_OLD: u16 = 0x0004;
pub const TYPE_FILL_VALUE: u16 = 0x0005;
pub const TYPE_LINK: u16 = 0x0006;
pub const TYPE_EXTERNAL_FILE: u16 = 0x0007;
pub const TYPE_DATA_LAYOUT: u16 = 0x0008;
pub const TYPE_GROUP_INFO: u16 = 0x000A;
pub const TYPE_FILTER_PIPELINE: u16 = 0x000B;
pub const TYPE_ATTRIBUTE: u16 = 0x000C;
pub const TYPE_OBJECT_COMMENT: u16 = 0x000D;
pub const TYPE_SHARED_MSG_TABLE: u16 = 0x000F;
pub const TYPE_CONTINUATION: u16 = 0x0010;
pub const TYPE_SYMBOL_TABLE: u16 = 0x0011;
pub const TYPE_OBJECT_MOD_TIME: u16 = 0x0012;
pub const TYPE_BTREE_K_VALUES: u16 = 0x0013;
pub const TYPE_ATTR_INFO: u16 = 0x0015;
pub const TYPE_OBJECT_REF_COUNT: u16 = 0x0016;
/// Historical NIL filler used by version-1 object headers to pad unused
/// message slots; never carries meaningful content.
pub const TYPE_NIL: u16 = 0x0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationMsg {
    pub addr: u64,
    pub length: u64,
}

impl ContinuationMsg {
    pub fn read(r: &mut ByteReader) -> Result<Self> {
        let addr = r.read_offset()?;
        let length = r.read_length()?;
        Ok(ContinuationMsg { addr, length })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Nil,
    Dataspace(Dataspace),
    Datatype(Datatype),
    DataLayout(DataLayout),
    FilterPipeline(FilterPipelineMsg),
    Attribute(AttributeMsg),
    Link(LinkMsg),
    SymbolTable(SymbolTableMsg),
    Continuation(ContinuationMsg),
    /// A message type this decoder does not interpret, preserved verbatim.
    Unknown { type_code: u16, raw: Vec<u8> },
}

/// A single decoded message plus the header-level flags byte it carried
/// (constant/shared/deleted bits), since the object header iterator needs
/// the flags even for types it does not otherwise look inside.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRecord {
    pub type_code: u16,
    pub flags: u8,
    pub body: Message,
}

impl MessageRecord {
    /// Decode one message body from `payload`, given its type code and the
    /// offset/length widths in force for the surrounding file.
    pub fn decode(type_code: u16, flags: u8, payload: &[u8], offset_width: u8, length_width: u8) -> Result<Self> {
        let mut r = ByteReader::new(Arc::new(payload.to_vec()) as Arc<dyn ByteSource>, offset_width, length_width);
        let body = match type_code {
            TYPE_NIL => Message::Nil,
            TYPE_DATASPACE => Message::Dataspace(Dataspace::read(&mut r)?),
            TYPE_DATATYPE => Message::Datatype(Datatype::read(&mut r)?),
            TYPE_DATA_LAYOUT => Message::DataLayout(DataLayout::read(&mut r)?),
            TYPE_FILTER_PIPELINE => Message::FilterPipeline(FilterPipelineMsg::read(&mut r)?),
            TYPE_ATTRIBUTE => Message::Attribute(AttributeMsg::read(&mut r)?),
            TYPE_LINK => Message::Link(LinkMsg::read(&mut r)?),
            TYPE_SYMBOL_TABLE => Message::SymbolTable(SymbolTableMsg::read(&mut r)?),
            TYPE_CONTINUATION => Message::Continuation(ContinuationMsg::read(&mut r)?),
            other => Message::Unknown { type_code: other, raw: payload.to_vec() },
        };
        Ok(MessageRecord { type_code, flags, body })
    }
}
