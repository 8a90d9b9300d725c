//! Dataspace message (type 0x0001): scalar, simple (N-dimensional), or null.

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataspaceKind {
    Scalar,
    Simple,
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataspace {
    pub version: u8,
    pub kind: DataspaceKind,
    pub dims: Vec<u64>,
    pub max_dims: Option<Vec<u64>>,
}

impl Dataspace {
    pub fn read(r: &mut ByteReader) -> Result<Self> {
        let offset = r.position();
        let version = r.read_u8()?;
        match version {
            1 => Self::read_v1(r, offset),
            2 => Self::read_v2(r, offset),
            other => Err(Hdf5Error::UnsupportedVersion { structure: "dataspace", version: other as u32 }),
        }
    }

    fn read_v1(r: &mut ByteReader, offset: u64) -> Result<Self> {
        let rank = r.read_u8()? as usize;
        let flags = r.read_u8()?;
        r.skip(5); // reserved
        let has_max_dims = flags & 0x01 != 0;

        let mut dims = Vec::with_capacity(rank);
        for _ in 0..rank {
            dims.push(r.read_length()?);
        }
        let max_dims = if has_max_dims {
            let mut m = Vec::with_capacity(rank);
            for _ in 0..rank {
                m.push(r.read_length()?);
            }
            Some(m)
        } else {
            None
        };

        let kind = if rank == 0 { DataspaceKind::Scalar } else { DataspaceKind::Simple };
        let _ = offset;
        Ok(Dataspace { version: 1, kind, dims, max_dims })
    }

    fn read_v2(r: &mut ByteReader, offset: u64) -> Result<Self> {
        let rank = r.read_u8()? as usize;
        let flags = r.read_u8()?;
        let kind_byte = r.read_u8()?;
        let has_max_dims = flags & 0x01 != 0;

        let kind = match kind_byte {
            0 => DataspaceKind::Scalar,
            1 => DataspaceKind::Simple,
            2 => DataspaceKind::Null,
            other => return Err(Hdf5Error::malformed("dataspace", offset, format!("unknown dataspace class {other}"))),
        };

        let mut dims = Vec::with_capacity(rank);
        for _ in 0..rank {
            dims.push(r.read_length()?);
        }
        let max_dims = if has_max_dims {
            let mut m = Vec::with_capacity(rank);
            for _ in 0..rank {
                m.push(r.read_length()?);
            }
            Some(m)
        } else {
            None
        };

        Ok(Dataspace { version: 2, kind, dims, max_dims })
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total element count across all dimensions (1 for a scalar, 0 for a
    /// null dataspace or any zero-length dimension).
    pub fn element_count(&self) -> u64 {
        match self.kind {
            DataspaceKind::Null => 0,
            DataspaceKind::Scalar => 1,
            DataspaceKind::Simple => self.dims.iter().product(),
        }
    }
}
