//! Decoded attribute values, resolved from raw [`AttributeMsg`] bytes using
//! the attribute's own datatype description.

use crate::heap::GlobalHeap;
use crate::message::datatype::DatatypeClass;
use crate::message::AttributeMsg;
use crate::reader::ByteReader;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Integer(i64),
    UnsignedInteger(u64),
    Float(f64),
    Str(String),
    IntegerArray(Vec<i64>),
    FloatArray(Vec<f64>),
    /// A type this decoder doesn't resolve to a native value (compound,
    /// enum, array-of-compound, etc); the raw bytes are preserved.
    Raw(Vec<u8>),
}

/// Decode an attribute's raw bytes using its own datatype description.
/// `reader` resolves variable-length strings, which are stored inline only
/// as a (length, global heap id) descriptor rather than their actual bytes.
pub fn decode(attr: &AttributeMsg, reader: &ByteReader) -> AttributeValue {
    match &attr.datatype.class {
        DatatypeClass::FixedPoint { signed, .. } => decode_fixed_point(&attr.raw_data, attr.datatype.size, *signed),
        DatatypeClass::FloatingPoint { .. } => decode_float(&attr.raw_data, attr.datatype.size),
        DatatypeClass::Str { .. } => {
            let end = attr.raw_data.iter().position(|&b| b == 0).unwrap_or(attr.raw_data.len());
            AttributeValue::Str(String::from_utf8_lossy(&attr.raw_data[..end]).into_owned())
        }
        DatatypeClass::VarLen { is_string: true, .. } => decode_varlen_string(&attr.raw_data, reader),
        _ => AttributeValue::Raw(attr.raw_data.clone()),
    }
}

/// A variable-length element is stored inline as `length: u32`, a global
/// heap collection address (`offset_width` bytes), and an object index
/// (`u32`); the actual bytes live in that heap collection. Resolves only a
/// single (scalar) element — an array of variable-length strings has no
/// native `AttributeValue` representation yet and falls back to `Raw`.
fn decode_varlen_string(data: &[u8], reader: &ByteReader) -> AttributeValue {
    let offset_width = reader.offset_width() as usize;
    let descriptor_size = 4 + offset_width + 4;
    if data.len() != descriptor_size {
        return AttributeValue::Raw(data.to_vec());
    }

    let length = u32::from_le_bytes(data[0..4].try_into().unwrap()) as usize;
    let mut collection_addr = 0u64;
    for (i, &b) in data[4..4 + offset_width].iter().enumerate() {
        collection_addr |= (b as u64) << (8 * i);
    }
    let object_index = u32::from_le_bytes(data[4 + offset_width..descriptor_size].try_into().unwrap());

    if collection_addr == 0 {
        return AttributeValue::Str(String::new());
    }

    match GlobalHeap::read(reader, collection_addr).ok().and_then(|h| h.object(object_index)) {
        Some(bytes) => {
            let bytes = if bytes.len() >= length { &bytes[..length] } else { &bytes[..] };
            AttributeValue::Str(String::from_utf8_lossy(bytes).into_owned())
        }
        None => AttributeValue::Raw(data.to_vec()),
    }
}

fn decode_fixed_point(data: &[u8], size: u32, signed: bool) -> AttributeValue {
    let elem_count = if size == 0 { 0 } else { data.len() / size as usize };
    if elem_count <= 1 {
        return scalar_fixed_point(data, size, signed);
    }
    let mut values = Vec::with_capacity(elem_count);
    for chunk in data.chunks_exact(size as usize) {
        match scalar_fixed_point(chunk, size, signed) {
            AttributeValue::Integer(v) => values.push(v),
            AttributeValue::UnsignedInteger(v) => values.push(v as i64),
            _ => {}
        }
    }
    AttributeValue::IntegerArray(values)
}

fn scalar_fixed_point(data: &[u8], size: u32, signed: bool) -> AttributeValue {
    let mut buf = [0u8; 8];
    let n = (size as usize).min(8);
    buf[..n].copy_from_slice(&data[..n]);
    let unsigned = u64::from_le_bytes(buf);
    if signed {
        let shift = 64 - n * 8;
        let value = ((unsigned << shift) as i64) >> shift;
        AttributeValue::Integer(value)
    } else {
        AttributeValue::UnsignedInteger(unsigned)
    }
}

fn decode_float(data: &[u8], size: u32) -> AttributeValue {
    let elem_count = if size == 0 { 0 } else { data.len() / size as usize };
    if elem_count <= 1 {
        return scalar_float(data, size);
    }
    let mut values = Vec::with_capacity(elem_count);
    for chunk in data.chunks_exact(size as usize) {
        if let AttributeValue::Float(v) = scalar_float(chunk, size) {
            values.push(v);
        }
    }
    AttributeValue::FloatArray(values)
}

fn scalar_float(data: &[u8], size: u32) -> AttributeValue {
    match size {
        4 => {
            let mut b = [0u8; 4];
            b.copy_from_slice(&data[..4]);
            AttributeValue::Float(f32::from_le_bytes(b) as f64)
        }
        8 => {
            let mut b = [0u8; 8];
            b.copy_from_slice(&data[..8]);
            AttributeValue::Float(f64::from_le_bytes(b))
        }
        _ => AttributeValue::Raw(data.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::message::dataspace::{Dataspace, DataspaceKind};
    use crate::message::datatype::Datatype;
    use crate::reader::ByteSource;

    fn reader() -> ByteReader {
        ByteReader::new(Arc::new(Vec::<u8>::new()) as Arc<dyn ByteSource>, 8, 8)
    }

    fn scalar_i32_type() -> Datatype {
        Datatype { version: 1, size: 4, class: DatatypeClass::FixedPoint { byte_order: crate::message::datatype::ByteOrder::LittleEndian, signed: true, bit_offset: 0, bit_precision: 32 } }
    }

    fn scalar_dataspace() -> Dataspace {
        Dataspace { version: 2, kind: DataspaceKind::Scalar, dims: vec![], max_dims: None }
    }

    #[test]
    fn decodes_signed_scalar_integer() {
        let attr = AttributeMsg { version: 2, name: "n".into(), datatype: scalar_i32_type(), dataspace: scalar_dataspace(), raw_data: (-5i32).to_le_bytes().to_vec() };
        assert_eq!(decode(&attr, &reader()), AttributeValue::Integer(-5));
    }

    #[test]
    fn decodes_string_attribute() {
        let dt = Datatype { version: 1, size: 8, class: DatatypeClass::Str { padding: crate::message::datatype::StringPadding::NullTerminate, charset: crate::message::datatype::CharSet::Utf8 } };
        let attr = AttributeMsg { version: 2, name: "s".into(), datatype: dt, dataspace: scalar_dataspace(), raw_data: b"hi\0\0\0\0\0\0".to_vec() };
        assert_eq!(decode(&attr, &reader()), AttributeValue::Str("hi".to_string()));
    }

    #[test]
    fn decodes_variable_length_string_via_global_heap() {
        // Global heap collection at address 64 holding one object ("hello")
        // at index 1.
        let mut body = Vec::new();
        body.extend_from_slice(&1u16.to_le_bytes()); // object index
        body.extend_from_slice(&1u16.to_le_bytes()); // ref count
        body.extend_from_slice(&[0u8; 4]); // reserved
        body.extend_from_slice(&5u64.to_le_bytes()); // object size
        body.extend_from_slice(b"hello");
        while body.len() % 8 != 0 {
            body.push(0);
        }
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&[0u8; 6]);

        let mut file = vec![0u8; 64];
        file.extend_from_slice(b"GCOL");
        file.push(1);
        file.extend_from_slice(&[0, 0, 0]);
        let collection_size = (16 + body.len()) as u64;
        file.extend_from_slice(&collection_size.to_le_bytes());
        file.extend_from_slice(&body);

        let r = ByteReader::new(Arc::new(file) as Arc<dyn ByteSource>, 8, 8);

        let dt = Datatype { version: 1, size: 16, class: DatatypeClass::VarLen { is_string: true, base: Box::new(scalar_i32_type()) } };
        let mut raw = Vec::new();
        raw.extend_from_slice(&5u32.to_le_bytes()); // length
        raw.extend_from_slice(&64u64.to_le_bytes()); // collection address
        raw.extend_from_slice(&1u32.to_le_bytes()); // object index
        let attr = AttributeMsg { version: 2, name: "s".into(), datatype: dt, dataspace: scalar_dataspace(), raw_data: raw };

        assert_eq!(decode(&attr, &r), AttributeValue::Str("hello".to_string()));
    }
}
