//! The entry point for opening an HDF5 file and walking its object graph.

use std::path::Path;
use std::sync::Arc;

use crate::error::{Hdf5Error, Result};
use crate::facade::dataset::Dataset;
use crate::facade::group::{ChildRef, Group};
use crate::message::{TYPE_DATASPACE, TYPE_DATA_LAYOUT, TYPE_DATATYPE};
use crate::reader::ByteReader;
use crate::superblock::Superblock;

/// Configuration for opening a file. Mirrors the handful of knobs real
/// HDF5 bindings expose for read-only access: whether to enforce the
/// metadata checksums the format embeds, and a cap on how deep a chain of
/// soft-link redirections may go before it's treated as a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub verify_checksums: bool,
    pub max_link_redirects: u32,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions { verify_checksums: true, max_link_redirects: 16 }
    }
}

pub enum Entry {
    Group(Group),
    Dataset(Dataset),
}

pub struct File {
    reader: ByteReader,
    superblock: Superblock,
    options: OpenOptions,
}

impl File {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, OpenOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(Hdf5Error::from)?;
        Self::from_source(Arc::new(file), options)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_source(Arc::new(bytes), OpenOptions::default())
    }

    pub fn from_source(source: Arc<dyn crate::reader::ByteSource>, options: OpenOptions) -> Result<Self> {
        let superblock = Superblock::read(Arc::clone(&source))?;
        let reader = superblock.reader_at(source, 0);
        Ok(File { reader, superblock, options })
    }

    pub fn version(&self) -> u8 {
        self.superblock.version
    }

    pub fn root(&self) -> Result<Group> {
        Group::open(self.reader.clone(), self.superblock.root_group_addr, "/".to_string(), self.options.verify_checksums)
    }

    /// Open an absolute path such as `/a/b/dataset`, following hard and
    /// soft links (bounded by `options.max_link_redirects`). External links
    /// are reported rather than crossed: this decoder never opens a second
    /// file implicitly.
    pub fn open_path(&self, path: &str) -> Result<Entry> {
        self.open_path_from(&self.root()?, path, 0)
    }

    fn open_path_from(&self, start: &Group, path: &str, redirects: u32) -> Result<Entry> {
        if redirects > self.options.max_link_redirects {
            return Err(Hdf5Error::malformed("file", 0, "soft link redirection limit exceeded"));
        }

        let path = path.trim_start_matches('/');
        let verify_checksums = self.options.verify_checksums;
        if path.is_empty() {
            return Ok(Entry::Group(Group::open(start.reader().clone(), start.addr, start.path.clone(), verify_checksums)?));
        }

        let mut current = Group::open(start.reader().clone(), start.addr, start.path.clone(), verify_checksums)?;
        let segments: Vec<&str> = path.split('/').collect();

        for (i, seg) in segments.iter().enumerate() {
            let child = current.child(seg)?.ok_or_else(|| super::group::missing_child(&current.path, seg))?;

            let is_last = i + 1 == segments.len();
            match child {
                ChildRef::Address(addr) => {
                    let child_path = format!("{}/{}", current.path.trim_end_matches('/'), seg);
                    if is_last {
                        return self.open_entry_at(addr, child_path);
                    }
                    current = Group::open(current.reader().clone(), addr, child_path, verify_checksums)?;
                }
                ChildRef::SoftLink(target) => {
                    let resolved = self.open_path_from(&self.root()?, &target, redirects + 1)?;
                    if is_last {
                        return Ok(resolved);
                    }
                    match resolved {
                        Entry::Group(g) => current = g,
                        Entry::Dataset(_) => {
                            return Err(Hdf5Error::malformed("file", 0, "soft link resolved to a dataset mid-path"));
                        }
                    }
                }
                ChildRef::ExternalLink { file_name, object_path } => {
                    return Err(Hdf5Error::unsupported_feature(
                        "link",
                        format!("external link to {file_name:?}:{object_path:?} (crossing files is out of scope)"),
                    ));
                }
            }
        }

        Ok(Entry::Group(current))
    }

    fn open_entry_at(&self, addr: u64, path: String) -> Result<Entry> {
        let group = Group::open(self.reader.clone(), addr, path, self.options.verify_checksums)?;
        let header = group.header();
        let is_dataset = header.find(TYPE_DATASPACE).is_some()
            && header.find(TYPE_DATATYPE).is_some()
            && header.find(TYPE_DATA_LAYOUT).is_some();

        if is_dataset {
            Ok(Entry::Dataset(Dataset::from_object_header(self.reader.clone(), header)?))
        } else {
            Ok(Entry::Group(group))
        }
    }
}

