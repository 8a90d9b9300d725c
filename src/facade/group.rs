//! A group opened for reading. Children are enumerated either through Link
//! messages (the modern scheme) or, if none are present, through the
//! legacy symbol table message (a B-tree v1 of group nodes plus the local
//! heap holding link names).

use chrono::{DateTime, Utc};

use crate::btree::group as group_btree;
use crate::error::{Hdf5Error, Result};
use crate::heap::LocalHeap;
use crate::message::link::LinkTarget;
use crate::message::{Message, TYPE_LINK, TYPE_SYMBOL_TABLE};
use crate::object_header::ObjectHeader;
use crate::reader::ByteReader;

/// Where a named child actually lives, before the caller decides whether to
/// open it as a group or a dataset (both are plain object headers; the
/// distinction only appears once the target's own messages are read).
#[derive(Debug, Clone, PartialEq)]
pub enum ChildRef {
    Address(u64),
    SoftLink(String),
    ExternalLink { file_name: String, object_path: String },
}

pub struct Group {
    reader: ByteReader,
    header: ObjectHeader,
    pub path: String,
    pub(crate) addr: u64,
}

impl Group {
    pub(crate) fn open(reader: ByteReader, addr: u64, path: String, verify_checksums: bool) -> Result<Self> {
        let header = ObjectHeader::read(&reader, addr, verify_checksums)?;
        Ok(Group { reader, header, path, addr })
    }

    pub fn members(&self) -> Result<Vec<String>> {
        let links: Vec<&Message> = self.header.find_all(TYPE_LINK).collect();
        if !links.is_empty() {
            return Ok(links
                .into_iter()
                .filter_map(|m| if let Message::Link(l) = m { Some(l.name.clone()) } else { None })
                .collect());
        }

        if let Some(Message::SymbolTable(st)) = self.header.find(TYPE_SYMBOL_TABLE) {
            let heap = LocalHeap::read(&self.reader, st.local_heap_addr)?;
            let entries = group_btree::traverse(&self.reader, st.btree_addr)?;
            return Ok(entries.iter().map(|e| heap.name_at(e.link_name_offset)).collect());
        }

        Ok(Vec::new())
    }

    pub fn child(&self, name: &str) -> Result<Option<ChildRef>> {
        for m in self.header.find_all(TYPE_LINK) {
            if let Message::Link(l) = m {
                if l.name == name {
                    return Ok(Some(match &l.target {
                        LinkTarget::Hard { object_header_addr } => ChildRef::Address(*object_header_addr),
                        LinkTarget::Soft { path } => ChildRef::SoftLink(path.clone()),
                        LinkTarget::External { file_name, object_path } => {
                            ChildRef::ExternalLink { file_name: file_name.clone(), object_path: object_path.clone() }
                        }
                    }));
                }
            }
        }

        if let Some(Message::SymbolTable(st)) = self.header.find(TYPE_SYMBOL_TABLE) {
            let heap = LocalHeap::read(&self.reader, st.local_heap_addr)?;
            let entries = group_btree::traverse(&self.reader, st.btree_addr)?;
            for e in entries {
                if heap.name_at(e.link_name_offset) == name {
                    return Ok(Some(ChildRef::Address(e.object_header_addr)));
                }
            }
        }

        Ok(None)
    }

    pub(crate) fn header(&self) -> &ObjectHeader {
        &self.header
    }

    /// Last-modified time, when the object header recorded one (v2 headers
    /// only; see [`ObjectHeader::modified`]).
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.header.modified
    }

    pub(crate) fn reader(&self) -> &ByteReader {
        &self.reader
    }
}

pub(crate) fn missing_child(path: &str, name: &str) -> Hdf5Error {
    Hdf5Error::malformed("group", 0, format!("no member named {name:?} under {path:?}"))
}
