//! Attribute message (type 0x000C): a named scalar or array value attached
//! to an object, carrying its own datatype and dataspace sub-encodings.
//! Versions 1 pads the name/datatype/dataspace blocks to 8-byte multiples;
//! versions 2/3 pack them back to back; version 3 adds a declared character
//! set for the name.

use std::sync::Arc;

use crate::error::Result;
use crate::message::dataspace::Dataspace;
use crate::message::datatype::Datatype;
use crate::reader::{ByteReader, ByteSource};

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMsg {
    pub version: u8,
    pub name: String,
    pub datatype: Datatype,
    pub dataspace: Dataspace,
    pub raw_data: Vec<u8>,
}

impl AttributeMsg {
    pub fn read(r: &mut ByteReader) -> Result<Self> {
        let version = r.read_u8()?;
        let (name_size, datatype_size, dataspace_size, padded) = if version == 1 {
            r.skip(1); // reserved
            let name_size = r.read_u16()? as usize;
            let datatype_size = r.read_u16()? as usize;
            let dataspace_size = r.read_u16()? as usize;
            (name_size, datatype_size, dataspace_size, true)
        } else {
            let _flags = r.read_u8()?;
            let name_size = r.read_u16()? as usize;
            let datatype_size = r.read_u16()? as usize;
            let dataspace_size = r.read_u16()? as usize;
            if version == 3 {
                let _name_charset = r.read_u8()?;
            }
            (name_size, datatype_size, dataspace_size, false)
        };

        let name = read_block(r, name_size, padded, |bytes| {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        })?;

        let datatype_bytes = read_raw_block(r, datatype_size, padded)?;
        let mut dt_reader = sub_reader(r, &datatype_bytes);
        let datatype = Datatype::read(&mut dt_reader)?;

        let dataspace_bytes = read_raw_block(r, dataspace_size, padded)?;
        let mut ds_reader = sub_reader(r, &dataspace_bytes);
        let dataspace = Dataspace::read(&mut ds_reader)?;

        let data_len = (datatype.byte_size() as u64 * dataspace.element_count()) as usize;
        let raw_data = r.read_bytes(data_len)?;

        Ok(AttributeMsg { version, name, datatype, dataspace, raw_data })
    }
}

fn read_raw_block(r: &mut ByteReader, size: usize, padded: bool) -> Result<Vec<u8>> {
    let bytes = r.read_bytes(size)?;
    if padded {
        let pad = (8 - (size % 8)) % 8;
        r.skip(pad as u64);
    }
    Ok(bytes)
}

fn read_block<T>(r: &mut ByteReader, size: usize, padded: bool, f: impl FnOnce(&[u8]) -> T) -> Result<T> {
    let bytes = read_raw_block(r, size, padded)?;
    Ok(f(&bytes))
}

fn sub_reader(r: &ByteReader, bytes: &[u8]) -> ByteReader {
    ByteReader::new(Arc::new(bytes.to_vec()) as Arc<dyn ByteSource>, r.offset_width(), r.length_width())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(bytes: Vec<u8>) -> ByteReader {
        ByteReader::new(Arc::new(bytes) as Arc<dyn ByteSource>, 8, 8)
    }

    fn scalar_i32_datatype() -> Vec<u8> {
        let mut b = Vec::new();
        b.push(0x10); // fixed point, version 1
        b.push(0x08);
        b.push(0); b.push(0);
        b.extend_from_slice(&4u32.to_le_bytes());
        b.extend_from_slice(&0u16.to_le_bytes());
        b.extend_from_slice(&32u16.to_le_bytes());
        b
    }

    fn scalar_dataspace_v1() -> Vec<u8> {
        let mut b = vec![1, 0, 0];
        b.extend_from_slice(&[0u8; 5]);
        b
    }

    #[test]
    fn v1_padded_attribute_roundtrip() {
        let name = b"units\0";
        let name_padded = pad8(name);
        let dt = scalar_i32_datatype();
        let dt_padded = pad8(&dt);
        let ds = scalar_dataspace_v1();
        let ds_padded = pad8(&ds);

        let mut b = vec![1, 0];
        b.extend_from_slice(&(name.len() as u16).to_le_bytes());
        b.extend_from_slice(&(dt.len() as u16).to_le_bytes());
        b.extend_from_slice(&(ds.len() as u16).to_le_bytes());
        b.extend_from_slice(&name_padded);
        b.extend_from_slice(&dt_padded);
        b.extend_from_slice(&ds_padded);
        b.extend_from_slice(&42i32.to_le_bytes());

        let mut r = reader(b);
        let attr = AttributeMsg::read(&mut r).unwrap();
        assert_eq!(attr.name, "units");
        assert_eq!(attr.raw_data, 42i32.to_le_bytes());
    }

    #[test]
    fn v3_unpadded_attribute_with_charset() {
        let name = b"desc\0";
        let dt = scalar_i32_datatype();
        let ds = scalar_dataspace_v2();

        let mut b = vec![3, 0];
        b.extend_from_slice(&(name.len() as u16).to_le_bytes());
        b.extend_from_slice(&(dt.len() as u16).to_le_bytes());
        b.extend_from_slice(&(ds.len() as u16).to_le_bytes());
        b.push(1); // utf-8 charset
        b.extend_from_slice(name);
        b.extend_from_slice(&dt);
        b.extend_from_slice(&ds);
        b.extend_from_slice(&7i32.to_le_bytes());

        let mut r = reader(b);
        let attr = AttributeMsg::read(&mut r).unwrap();
        assert_eq!(attr.name, "desc");
        assert_eq!(attr.raw_data, 7i32.to_le_bytes());
    }

    fn scalar_dataspace_v2() -> Vec<u8> {
        vec![2, 0, 0, 0]
    }

    fn pad8(bytes: &[u8]) -> Vec<u8> {
        let mut v = bytes.to_vec();
        while v.len() % 8 != 0 {
            v.push(0);
        }
        v
    }
}
