//! Recursive datatype language (message type 0x0003).
//!
//! The first byte packs class (low nibble) and version (high nibble); three
//! class-specific bit-field bytes follow, then a 4-byte total size, then
//! class-specific properties — several of which (compound, array, varlen)
//! recursively embed another datatype. The tree is owned exclusively by the
//! message that embeds it: there is no sharing, so no cycle is possible and
//! structural equality is just derived `PartialEq`.

use crate::error::{Hdf5Error, Result};
use crate::reader::ByteReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringPadding {
    NullTerminate,
    NullPad,
    SpacePad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharSet {
    Ascii,
    Utf8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundMember {
    pub name: String,
    pub byte_offset: u64,
    pub datatype: Datatype,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatatypeClass {
    FixedPoint {
        byte_order: ByteOrder,
        signed: bool,
        bit_offset: u16,
        bit_precision: u16,
    },
    FloatingPoint {
        byte_order: ByteOrder,
        sign_bit_location: u8,
        exponent_location: u8,
        exponent_size: u8,
        mantissa_location: u8,
        mantissa_size: u8,
        exponent_bias: u32,
    },
    Str {
        padding: StringPadding,
        charset: CharSet,
    },
    BitField {
        raw_bitfields: [u8; 3],
    },
    Opaque {
        tag: String,
    },
    Compound {
        members: Vec<CompoundMember>,
    },
    Reference,
    Time {
        raw_bitfields: [u8; 3],
    },
    Enum {
        base: Box<Datatype>,
        members: Vec<(String, Vec<u8>)>,
    },
    VarLen {
        is_string: bool,
        base: Box<Datatype>,
    },
    Array {
        dims: Vec<u32>,
        base: Box<Datatype>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Datatype {
    pub version: u8,
    pub size: u32,
    pub class: DatatypeClass,
}

impl Datatype {
    /// Parse a datatype value, advancing `r` past it. `compound_hint` is the
    /// enclosing compound's own byte size, which in version-1/2 compound
    /// members chooses the byte-offset field width (4 bytes always for those
    /// versions per spec; version-3 chooses width from the *member's own*
    /// compound size, already folded in by the caller).
    pub fn read(r: &mut ByteReader) -> Result<Self> {
        let offset = r.position();
        let class_and_version = r.read_u8()?;
        let class_id = class_and_version & 0x0F;
        let version = (class_and_version >> 4) & 0x0F;
        let mut bitfields = [0u8; 3];
        r.read_exact(&mut bitfields)?;
        let size = r.read_u32()?;

        let class = match class_id {
            0 => {
                let byte_order = if bitfields[0] & 0x01 != 0 { ByteOrder::BigEndian } else { ByteOrder::LittleEndian };
                let signed = bitfields[0] & 0x08 != 0;
                let bit_offset = r.read_u16()?;
                let bit_precision = r.read_u16()?;
                DatatypeClass::FixedPoint { byte_order, signed, bit_offset, bit_precision }
            }
            1 => {
                let byte_order = if bitfields[0] & 0x01 != 0 { ByteOrder::BigEndian } else { ByteOrder::LittleEndian };
                let _bit_offset = r.read_u16()?;
                let _bit_precision = r.read_u16()?;
                let sign_bit_location = r.read_u8()?;
                let exponent_location = r.read_u8()?;
                let exponent_size = r.read_u8()?;
                let mantissa_location = r.read_u8()?;
                let mantissa_size = r.read_u8()?;
                let exponent_bias = r.read_u32()?;
                DatatypeClass::FloatingPoint {
                    byte_order,
                    sign_bit_location,
                    exponent_location,
                    exponent_size,
                    mantissa_location,
                    mantissa_size,
                    exponent_bias,
                }
            }
            2 => DatatypeClass::Time { raw_bitfields: bitfields },
            3 => {
                let padding = match bitfields[0] & 0x0F {
                    0 => StringPadding::NullTerminate,
                    1 => StringPadding::NullPad,
                    2 => StringPadding::SpacePad,
                    other => return Err(Hdf5Error::malformed("datatype", offset, format!("unknown string padding {other}"))),
                };
                let charset = match (bitfields[0] >> 4) & 0x0F {
                    0 => CharSet::Ascii,
                    1 => CharSet::Utf8,
                    other => return Err(Hdf5Error::malformed("datatype", offset, format!("unknown character set {other}"))),
                };
                DatatypeClass::Str { padding, charset }
            }
            4 => DatatypeClass::BitField { raw_bitfields: bitfields },
            5 => {
                let tag_len = (bitfields[0] as usize) & 0xFF;
                // Opaque tag length is stored as `size` field's associated
                // ASCII tag, padded to a multiple of 8 bytes; length is in
                // bitfields[0] per the low byte of the class bit field.
                let raw = r.read_bytes(tag_len)?;
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                DatatypeClass::Opaque { tag: String::from_utf8_lossy(&raw[..end]).into_owned() }
            }
            6 => {
                let num_members = u16::from_le_bytes([bitfields[0], bitfields[1]]) as usize;
                let mut members = Vec::with_capacity(num_members);
                for _ in 0..num_members {
                    let name = read_member_name(r, version)?;
                    let byte_offset = if version == 3 {
                        read_compound_offset(r, size)?
                    } else {
                        r.read_u32()? as u64
                    };
                    if version < 3 {
                        // versions 1/2 carry dimensionality fields here that
                        // modern files no longer populate meaningfully;
                        // skip the legacy dimensionality block.
                        if version == 1 {
                            let _dimensionality = r.read_u8()?;
                            r.skip(3); // reserved
                            r.skip(4 * 4); // permutation index + reserved
                            r.skip(4 * 4); // dim sizes
                        }
                    }
                    let datatype = Datatype::read(r)?;
                    members.push(CompoundMember { name, byte_offset, datatype });
                }
                DatatypeClass::Compound { members }
            }
            7 => DatatypeClass::Reference,
            8 => {
                let base = Box::new(Datatype::read(r)?);
                let num_members = u16::from_le_bytes([bitfields[0], bitfields[1]]) as usize;
                let mut names = Vec::with_capacity(num_members);
                for _ in 0..num_members {
                    names.push(read_member_name(r, version)?);
                }
                let mut members = Vec::with_capacity(num_members);
                for name in names {
                    let value = r.read_bytes(base.size as usize)?;
                    members.push((name, value));
                }
                DatatypeClass::Enum { base, members }
            }
            9 => {
                let is_string = (bitfields[0] & 0x0F) == 1;
                let base = Box::new(Datatype::read(r)?);
                DatatypeClass::VarLen { is_string, base }
            }
            10 => {
                let dim_count = r.read_u8()? as usize;
                // Version 3 dropped the 3 reserved bytes that versions 1/2
                // carried between the dimensionality and the dimension
                // sizes; reading past it would consume the first dim size
                // as padding instead.
                if version < 3 {
                    r.skip(3); // reserved
                }
                let mut dims = Vec::with_capacity(dim_count);
                for _ in 0..dim_count {
                    dims.push(r.read_u32()?);
                }
                let base = Box::new(Datatype::read(r)?);
                DatatypeClass::Array { dims, base }
            }
            other => return Err(Hdf5Error::malformed("datatype", offset, format!("unknown datatype class {other}"))),
        };

        Ok(Datatype { version, size, class })
    }

    /// Number of bytes an instance of this type occupies, excluding any
    /// indirection through a global heap for variable-length payloads (the
    /// on-disk inline representation of a varlen value is a fixed-size
    /// descriptor, not `size`).
    pub fn byte_size(&self) -> u32 {
        self.size
    }

    pub fn is_variable_length(&self) -> bool {
        matches!(self.class, DatatypeClass::VarLen { .. })
    }
}

fn read_member_name(r: &mut ByteReader, version: u8) -> Result<String> {
    let mut bytes = Vec::new();
    loop {
        let b = r.read_u8()?;
        if b == 0 {
            break;
        }
        bytes.push(b);
    }
    if version <= 2 {
        // Padded to a multiple of 8 bytes including the NUL terminator.
        let consumed = bytes.len() + 1;
        let pad = (8 - (consumed % 8)) % 8;
        r.skip(pad as u64);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Version-3 compound member byte offsets are encoded in 1, 2, 4, or 8 bytes
/// depending on the compound's own total size.
fn read_compound_offset(r: &mut ByteReader, compound_size: u32) -> Result<u64> {
    let width: u8 = if compound_size < (1 << 8) {
        1
    } else if compound_size < (1 << 16) {
        2
    } else if (compound_size as u64) < (1u64 << 32) {
        4
    } else {
        8
    };
    Ok(r.read_uint(width)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::reader::ByteSource;

    fn reader(bytes: Vec<u8>) -> ByteReader {
        ByteReader::new(Arc::new(bytes) as Arc<dyn ByteSource>, 8, 8)
    }

    fn fixed_point_i32_le() -> Vec<u8> {
        let mut b = Vec::new();
        b.push(0x10); // class 0, version 1
        b.push(0x08); // signed bit set, little-endian
        b.push(0); b.push(0);
        b.extend_from_slice(&4u32.to_le_bytes()); // size
        b.extend_from_slice(&0u16.to_le_bytes()); // bit offset
        b.extend_from_slice(&32u16.to_le_bytes()); // bit precision
        b
    }

    #[test]
    fn parses_signed_fixed_point() {
        let mut r = reader(fixed_point_i32_le());
        let dt = Datatype::read(&mut r).unwrap();
        assert_eq!(dt.size, 4);
        match dt.class {
            DatatypeClass::FixedPoint { signed, byte_order, bit_precision, .. } => {
                assert!(signed);
                assert_eq!(byte_order, ByteOrder::LittleEndian);
                assert_eq!(bit_precision, 32);
            }
            other => panic!("expected FixedPoint, got {other:?}"),
        }
    }

    #[test]
    fn parses_double_precision_float() {
        let mut b = Vec::new();
        b.push(0x11); // class 1, version 1
        b.push(0); b.push(0); b.push(0);
        b.extend_from_slice(&8u32.to_le_bytes());
        b.extend_from_slice(&0u16.to_le_bytes()); // bit offset
        b.extend_from_slice(&64u16.to_le_bytes()); // bit precision
        b.push(63); // sign bit location
        b.push(52); // exponent location
        b.push(11); // exponent size
        b.push(0);  // mantissa location
        b.push(52); // mantissa size
        b.extend_from_slice(&1023u32.to_le_bytes()); // exponent bias

        let mut r = reader(b);
        let dt = Datatype::read(&mut r).unwrap();
        assert_eq!(dt.size, 8);
        assert!(matches!(dt.class, DatatypeClass::FloatingPoint { mantissa_size: 52, .. }));
    }

    #[test]
    fn parses_nested_array_of_compound() {
        // compound { x: i32 @0, y: i32 @4 } wrapped in array[3]
        let mut compound = Vec::new();
        compound.push(0x36); // class 6, version 3
        compound.push(2); compound.push(0); compound.push(0); // 2 members
        compound.extend_from_slice(&8u32.to_le_bytes()); // compound size

        for (name, off) in [("x", 0u64), ("y", 4u64)] {
            compound.extend_from_slice(name.as_bytes());
            compound.push(0);
            compound.push(off as u8); // 1-byte offset (compound_size < 256)
            compound.extend_from_slice(&fixed_point_i32_le());
        }

        let mut array = Vec::new();
        array.push(0x3A); // class 10, version 3
        array.push(0); array.push(0); array.push(0);
        array.extend_from_slice(&24u32.to_le_bytes()); // 3 * 8
        array.push(1); // dim count (rank 1)
        // version 3 has no reserved bytes here, unlike versions 1/2
        array.extend_from_slice(&3u32.to_le_bytes()); // dim size
        array.extend_from_slice(&compound);

        let mut r = reader(array);
        let dt = Datatype::read(&mut r).unwrap();
        match dt.class {
            DatatypeClass::Array { dims, base } => {
                assert_eq!(dims, vec![3]);
                match base.class {
                    DatatypeClass::Compound { members } => {
                        assert_eq!(members.len(), 2);
                        assert_eq!(members[0].name, "x");
                        assert_eq!(members[0].byte_offset, 0);
                        assert_eq!(members[1].name, "y");
                        assert_eq!(members[1].byte_offset, 4);
                    }
                    other => panic!("expected Compound, got {other:?}"),
                }
            }
            other => panic!("expected Array, got {other:?}"),
        }
    }

    #[test]
    fn parses_legacy_array_with_reserved_bytes() {
        // array[4] of i32, version 2: dim count is followed by 3 reserved
        // bytes before the dimension sizes, unlike version 3.
        let mut array = Vec::new();
        array.push(0x2A); // class 10, version 2
        array.push(0); array.push(0); array.push(0);
        array.extend_from_slice(&16u32.to_le_bytes()); // 4 * 4
        array.push(1); // dim count
        array.extend_from_slice(&[0, 0, 0]); // reserved
        array.extend_from_slice(&4u32.to_le_bytes()); // dim size
        array.extend_from_slice(&fixed_point_i32_le());

        let mut r = reader(array);
        let dt = Datatype::read(&mut r).unwrap();
        match dt.class {
            DatatypeClass::Array { dims, base } => {
                assert_eq!(dims, vec![4]);
                assert!(matches!(base.class, DatatypeClass::FixedPoint { .. }));
            }
            other => panic!("expected Array, got {other:?}"),
        }
    }

    #[test]
    fn parses_variable_length_string() {
        let mut b = Vec::new();
        b.push(0x19); // class 9, version 1
        b.push(0x01); // low nibble 1 => string
        b.push(0); b.push(0);
        b.extend_from_slice(&16u32.to_le_bytes());
        // base type: a 1-byte ascii string element
        b.push(0x13);
        b.push(0x00); // null-terminate padding, ascii
        b.push(0); b.push(0);
        b.extend_from_slice(&1u32.to_le_bytes());

        let mut r = reader(b);
        let dt = Datatype::read(&mut r).unwrap();
        assert!(dt.is_variable_length());
        match dt.class {
            DatatypeClass::VarLen { is_string, .. } => assert!(is_string),
            other => panic!("expected VarLen, got {other:?}"),
        }
    }
}
