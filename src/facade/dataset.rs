//! A dataset opened for reading: its cached dataspace, datatype, data
//! layout, and (if present) filter pipeline messages, plus the storage
//! layout built from them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{Hdf5Error, Result};
use crate::facade::attribute_value::{self, AttributeValue};
use crate::layout::{self, Layout};
use crate::message::{AttributeMsg, DataLayout, Dataspace, Datatype, FilterPipelineMsg, Message, TYPE_ATTRIBUTE};
use crate::object_header::ObjectHeader;
use crate::reader::ByteReader;

pub struct Dataset {
    reader: ByteReader,
    dataspace: Dataspace,
    datatype: Datatype,
    data_layout: DataLayout,
    filter_pipeline: Option<FilterPipelineMsg>,
    attributes: Vec<AttributeMsg>,
    modified: Option<DateTime<Utc>>,
}

impl Dataset {
    pub(crate) fn from_object_header(reader: ByteReader, header: &ObjectHeader) -> Result<Self> {
        let dataspace = match header.find(crate::message::TYPE_DATASPACE) {
            Some(Message::Dataspace(ds)) => ds.clone(),
            _ => return Err(Hdf5Error::malformed("dataset", 0, "object has no dataspace message")),
        };
        let datatype = match header.find(crate::message::TYPE_DATATYPE) {
            Some(Message::Datatype(dt)) => dt.clone(),
            _ => return Err(Hdf5Error::malformed("dataset", 0, "object has no datatype message")),
        };
        let data_layout = match header.find(crate::message::TYPE_DATA_LAYOUT) {
            Some(Message::DataLayout(dl)) => dl.clone(),
            _ => return Err(Hdf5Error::malformed("dataset", 0, "object has no data layout message")),
        };
        let filter_pipeline = match header.find(crate::message::TYPE_FILTER_PIPELINE) {
            Some(Message::FilterPipeline(fp)) => Some(fp.clone()),
            _ => None,
        };
        let attributes = header
            .find_all(TYPE_ATTRIBUTE)
            .filter_map(|m| if let Message::Attribute(a) = m { Some(a.clone()) } else { None })
            .collect();

        Ok(Dataset { reader, dataspace, datatype, data_layout, filter_pipeline, attributes, modified: header.modified })
    }

    /// Last-modified time, when the object header recorded one (v2 headers
    /// only; see [`ObjectHeader::modified`]).
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    pub fn shape(&self) -> &[u64] {
        &self.dataspace.dims
    }

    pub fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    pub fn element_count(&self) -> u64 {
        self.dataspace.element_count()
    }

    fn layout(&self) -> Box<dyn Layout + '_> {
        layout::build(&self.reader, &self.data_layout, &self.dataspace.dims, &self.datatype, self.filter_pipeline.as_ref())
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        self.layout().read_all()
    }

    pub fn read_hyperslab(&self, start: &[u64], count: &[u64]) -> Result<Vec<u8>> {
        self.layout().read_hyperslab(start, count)
    }

    pub fn attributes(&self) -> HashMap<String, AttributeValue> {
        self.attributes.iter().map(|a| (a.name.clone(), attribute_value::decode(a, &self.reader))).collect()
    }
}
