//! A read-only decoder for the HDF5 hierarchical scientific data format.
//!
//! Start at [`File::open`] (or [`File::from_bytes`] for an in-memory
//! buffer), walk the object graph through [`Group`], and read array
//! contents through [`Dataset`]. Everything below the façade module —
//! superblock, heaps, messages, object headers, chunk indices, and
//! filters — is exposed for callers that need to inspect the format at a
//! lower level, but [`File`]/[`Group`]/[`Dataset`] cover ordinary use.

pub mod btree;
pub mod checksum;
pub mod error;
pub mod facade;
pub mod filter;
pub mod heap;
pub mod layout;
pub mod message;
pub mod object_header;
pub mod reader;
pub mod superblock;

pub use error::{Hdf5Error, Result};
pub use facade::{AttributeValue, Dataset, Entry, File, Group, OpenOptions};
pub use reader::{ByteReader, ByteSource};
