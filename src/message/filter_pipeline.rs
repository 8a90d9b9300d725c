//! Filter pipeline message (type 0x000B): the ordered list of filters
//! applied to chunked data. Version 1 pads each filter entry to an 8-byte
//! boundary and always carries a name; version 2 drops that padding and the
//! name field for filters with a registered id below 256.

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

pub const FILTER_DEFLATE: u16 = 1;
pub const FILTER_SHUFFLE: u16 = 2;
pub const FILTER_FLETCHER32: u16 = 3;
pub const FILTER_SZIP: u16 = 4;
pub const FILTER_NBIT: u16 = 5;
pub const FILTER_SCALEOFFSET: u16 = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterDescription {
    pub id: u16,
    pub name: String,
    pub optional: bool,
    pub client_data: Vec<u32>,
}

impl FilterDescription {
    /// The "optional" bit: if set, a decoder that does not recognise this
    /// filter may skip it rather than fail the whole dataset.
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterPipelineMsg {
    pub version: u8,
    pub filters: Vec<FilterDescription>,
}

impl FilterPipelineMsg {
    pub fn read(r: &mut ByteReader) -> Result<Self> {
        let version = r.read_u8()?;
        match version {
            1 => Self::read_v1(r),
            2 => Self::read_v2(r),
            other => Err(Hdf5Error::UnsupportedVersion { structure: "filter pipeline", version: other as u32 }),
        }
    }

    fn read_v1(r: &mut ByteReader) -> Result<Self> {
        let num_filters = r.read_u8()? as usize;
        r.skip(6); // reserved

        let mut filters = Vec::with_capacity(num_filters);
        for _ in 0..num_filters {
            let id = r.read_u16()?;
            let name_len = r.read_u16()? as usize;
            let flags = r.read_u16()?;
            let num_values = r.read_u16()? as usize;

            let name = if name_len > 0 {
                let raw = r.read_bytes(name_len)?;
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                String::from_utf8_lossy(&raw[..end]).into_owned()
            } else {
                String::new()
            };

            let mut client_data = Vec::with_capacity(num_values);
            for _ in 0..num_values {
                client_data.push(r.read_u32()?);
            }
            if num_values % 2 != 0 {
                r.skip(4); // padding to keep the entry 8-byte aligned
            }

            filters.push(FilterDescription { id, name, optional: flags & 0x0001 != 0, client_data });
        }

        Ok(FilterPipelineMsg { version: 1, filters })
    }

    fn read_v2(r: &mut ByteReader) -> Result<Self> {
        let num_filters = r.read_u8()? as usize;

        let mut filters = Vec::with_capacity(num_filters);
        for _ in 0..num_filters {
            let id = r.read_u16()?;
            let name = if id >= 256 {
                let name_len = r.read_u16()? as usize;
                let raw = r.read_bytes(name_len)?;
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                String::from_utf8_lossy(&raw[..end]).into_owned()
            } else {
                String::new()
            };
            let flags = r.read_u16()?;
            let num_values = r.read_u16()? as usize;
            let mut client_data = Vec::with_capacity(num_values);
            for _ in 0..num_values {
                client_data.push(r.read_u32()?);
            }

            filters.push(FilterDescription { id, name, optional: flags & 0x0001 != 0, client_data });
        }

        Ok(FilterPipelineMsg { version: 2, filters })
    }
}
