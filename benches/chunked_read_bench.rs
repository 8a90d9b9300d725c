use std::io::Write;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flate2::write::ZlibEncoder;
use flate2::Compression;

use rhdf5::checksum::lookup3;
use rhdf5::{Entry, File};

const SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1A, b'\n'];

fn object_header_v2(messages: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (type_code, payload) in messages {
        body.extend_from_slice(&type_code.to_le_bytes());
        body.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        body.push(0);
        body.extend_from_slice(payload);
    }
    let mut h = Vec::new();
    h.extend_from_slice(b"OHDR");
    h.push(2);
    h.push(0x01); // chunk size width: 2 bytes
    h.extend_from_slice(&(body.len() as u16).to_le_bytes());
    h.extend_from_slice(&body);
    h
}

fn btree_v1_chunk_leaf(entries: &[(u32, u64, u64)]) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(b"TREE");
    b.push(1);
    b.push(0);
    b.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    b.extend_from_slice(&u64::MAX.to_le_bytes());
    b.extend_from_slice(&u64::MAX.to_le_bytes());
    for (size, offset, child) in entries {
        b.extend_from_slice(&size.to_le_bytes());
        b.extend_from_slice(&0u32.to_le_bytes()); // filter mask
        b.extend_from_slice(&offset.to_le_bytes());
        b.extend_from_slice(&0u64.to_le_bytes()); // element offset slot
        b.extend_from_slice(&child.to_le_bytes());
    }
    b.extend_from_slice(&0u32.to_le_bytes());
    b.extend_from_slice(&0u32.to_le_bytes());
    b.extend_from_slice(&0u64.to_le_bytes());
    b.extend_from_slice(&0u64.to_le_bytes());
    b
}

/// A chunked int32 dataset, `chunk_count` chunks of `chunk_elems` elements
/// each, every chunk individually deflated and indexed through a single
/// B-tree v1 leaf node.
fn build_chunked_fixture(chunk_count: u64, chunk_elems: u64) -> Vec<u8> {
    let mut buf = vec![0u8; 48];
    let mut entries = Vec::new();
    for i in 0..chunk_count {
        let values: Vec<i32> = (0..chunk_elems).map(|v| (i * chunk_elems + v) as i32).collect();
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&raw).unwrap();
        let compressed = enc.finish().unwrap();

        while buf.len() % 8 != 0 {
            buf.push(0);
        }
        let addr = buf.len() as u64;
        buf.extend_from_slice(&compressed);
        entries.push((compressed.len() as u32, i * chunk_elems, addr));
    }

    while buf.len() % 8 != 0 {
        buf.push(0);
    }
    let tree_addr = buf.len() as u64;
    buf.extend_from_slice(&btree_v1_chunk_leaf(&entries));

    let total_elems = chunk_count * chunk_elems;
    let mut dataspace = vec![2, 1, 0, 1]; // version 2, rank 1, flags 0, kind simple
    dataspace.extend_from_slice(&total_elems.to_le_bytes());

    let datatype = vec![0x10, 0x08, 0, 0, 4, 0, 0, 0, 0, 0, 32, 0]; // int32, fixed point, version 1

    let mut layout = vec![3, 2, 2]; // version 3, chunked, dimensionality 2
    layout.extend_from_slice(&tree_addr.to_le_bytes());
    layout.extend_from_slice(&(chunk_elems as u32).to_le_bytes());
    layout.extend_from_slice(&4u32.to_le_bytes()); // trailing element-size slot

    let filter_pipeline = vec![2, 1, 1, 0, 0, 0, 0, 0]; // version 2, one filter: deflate, no client data

    while buf.len() % 8 != 0 {
        buf.push(0);
    }
    let ds_addr = buf.len() as u64;
    buf.extend_from_slice(&object_header_v2(&[
        (0x0001, dataspace),
        (0x0003, datatype),
        (0x0008, layout),
        (0x000B, filter_pipeline),
    ]));

    while buf.len() % 8 != 0 {
        buf.push(0);
    }
    let mut hard_link = vec![1, 0x00, 4];
    hard_link.extend_from_slice(b"data");
    hard_link.extend_from_slice(&ds_addr.to_le_bytes());
    let root_addr = buf.len() as u64;
    buf.extend_from_slice(&object_header_v2(&[(0x0006, hard_link)]));

    let eof = buf.len() as u64;
    let mut sb = Vec::new();
    sb.extend_from_slice(&SIGNATURE);
    sb.push(3);
    sb.push(8);
    sb.push(8);
    sb.push(0);
    sb.extend_from_slice(&0u64.to_le_bytes());
    sb.extend_from_slice(&u64::MAX.to_le_bytes());
    sb.extend_from_slice(&eof.to_le_bytes());
    sb.extend_from_slice(&root_addr.to_le_bytes());
    let checksum = lookup3(&sb);
    sb.extend_from_slice(&checksum.to_le_bytes());
    buf[..48].copy_from_slice(&sb);
    buf
}

fn bench_chunked_read(c: &mut Criterion) {
    let small = build_chunked_fixture(16, 64);
    let large = build_chunked_fixture(256, 256);

    c.bench_function("chunked_read_16x64_i32_deflate", |b| {
        b.iter(|| {
            let file = File::from_bytes(black_box(small.clone())).unwrap();
            let Entry::Dataset(ds) = file.open_path("/data").unwrap() else { panic!("expected dataset") };
            black_box(ds.read().unwrap())
        })
    });

    c.bench_function("chunked_read_256x256_i32_deflate", |b| {
        b.iter(|| {
            let file = File::from_bytes(black_box(large.clone())).unwrap();
            let Entry::Dataset(ds) = file.open_path("/data").unwrap() else { panic!("expected dataset") };
            black_box(ds.read().unwrap())
        })
    });
}

criterion_group!(benches, bench_chunked_read);
criterion_main!(benches);
