//! Link message (type 0x0006): a named edge from a group to hard, soft, or
//! external link target. Width of the link-name-length field and presence of
//! the creation-order/charset fields are controlled by a leading flags byte.

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    Hard { object_header_addr: u64 },
    Soft { path: String },
    External { file_name: String, object_path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkMsg {
    pub name: String,
    pub creation_order: Option<u64>,
    pub target: LinkTarget,
}

impl LinkMsg {
    pub fn read(r: &mut ByteReader) -> Result<Self> {
        let offset = r.position();
        let version = r.read_u8()?;
        if version != 1 {
            return Err(Hdf5Error::UnsupportedVersion { structure: "link", version: version as u32 });
        }
        let flags = r.read_u8()?;

        let link_type = if flags & 0x08 != 0 { r.read_u8()? } else { 0 };
        let creation_order = if flags & 0x04 != 0 { Some(r.read_u64()?) } else { None };
        if flags & 0x10 != 0 {
            let _charset = r.read_u8()?;
        }

        let name_len_width: u8 = match flags & 0x03 {
            0 => 1,
            1 => 2,
            2 => 4,
            3 => 8,
            _ => unreachable!(),
        };
        let name_len = r.read_uint(name_len_width)? as usize;
        let name_bytes = r.read_bytes(name_len)?;
        let name = String::from_utf8_lossy(&name_bytes).into_owned();

        let target = match link_type {
            0 => LinkTarget::Hard { object_header_addr: r.read_offset()? },
            1 => {
                let len = r.read_u16()? as usize;
                let bytes = r.read_bytes(len)?;
                LinkTarget::Soft { path: String::from_utf8_lossy(&bytes).into_owned() }
            }
            64 => {
                let len = r.read_u16()? as usize;
                let bytes = r.read_bytes(len)?;
                // payload: version byte, NUL-terminated filename, NUL-terminated object path
                if bytes.is_empty() {
                    return Err(Hdf5Error::malformed("link", offset, "empty external link payload"));
                }
                let body = &bytes[1..];
                let split = body.iter().position(|&b| b == 0).unwrap_or(body.len());
                let file_name = String::from_utf8_lossy(&body[..split]).into_owned();
                let rest = if split < body.len() { &body[split + 1..] } else { &[] };
                let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
                let object_path = String::from_utf8_lossy(&rest[..end]).into_owned();
                LinkTarget::External { file_name, object_path }
            }
            other => {
                return Err(Hdf5Error::unsupported_feature("link", format!("link type {other}")));
            }
        };

        Ok(LinkMsg { name, creation_order, target })
    }
}
