//! A single error taxonomy shared by every layer of the decoder.
//!
//! Every fallible parse in this crate returns [`Hdf5Error`] rather than a
//! per-module error type: the façade composes superblock, heap, message,
//! object-header, B-tree and layout subsystems in a single call chain, and a
//! zoo of `From` conversions at each boundary would hide exactly the
//! information (structure name, byte offset, expected vs. computed checksum)
//! callers need to diagnose a malformed file.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Hdf5Error {
    /// The 8-byte file signature was not found at any candidate offset.
    #[error("not an HDF5 file: signature not found at offsets 0, 512, 1024, 2048")]
    NotRecognised,

    /// A structural version byte was outside the set this decoder understands.
    #[error("unsupported {structure} version {version}")]
    UnsupportedVersion { structure: &'static str, version: u32 },

    /// Size fields disagreed with available bytes, a required signature
    /// mismatched, or some other structural invariant was violated.
    #[error("malformed {structure} at offset {offset:#x}: {detail}")]
    Malformed {
        structure: &'static str,
        offset: u64,
        detail: String,
    },

    /// A stored lookup3 or Fletcher-32 checksum did not match the computed
    /// value.
    #[error("{structure} checksum mismatch at offset {offset:#x}: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumFailure {
        structure: &'static str,
        offset: u64,
        expected: u32,
        computed: u32,
    },

    /// A required filter or index extension is not implemented. Scoped to
    /// the dataset being read; other datasets in the same file remain
    /// readable.
    #[error("unsupported feature in {structure}: {feature}")]
    UnsupportedFeature {
        structure: &'static str,
        feature: String,
    },

    /// Propagated unchanged from the underlying random-access byte source.
    #[error("byte source error: {0}")]
    ByteSource(#[from] io::Error),

    /// A slice request exceeded dataspace dimensions, or a coordinate rank
    /// mismatched the dataset's rank.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
}

pub type Result<T> = std::result::Result<T, Hdf5Error>;

impl Hdf5Error {
    pub fn malformed(structure: &'static str, offset: u64, detail: impl Into<String>) -> Self {
        Hdf5Error::Malformed { structure, offset, detail: detail.into() }
    }

    pub fn unsupported_feature(structure: &'static str, feature: impl Into<String>) -> Self {
        Hdf5Error::UnsupportedFeature { structure, feature: feature.into() }
    }
}
