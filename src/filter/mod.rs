//! Filter pipeline application: decoding a stored chunk means running its
//! declared filters in reverse of the order they were applied on write,
//! honoring each chunk's own filter mask (a bit per pipeline position,
//! set when that filter was skipped for this particular chunk because it
//! would have made the chunk larger).

pub mod deflate;
pub mod shuffle;

use crate::checksum::fletcher32;
use crate::error::{Hdf5Error, Result};
use crate::message::filter_pipeline::{
    FilterDescription, FilterPipelineMsg, FILTER_DEFLATE, FILTER_FLETCHER32, FILTER_NBIT, FILTER_SCALEOFFSET, FILTER_SHUFFLE, FILTER_SZIP,
};

/// Emitted when a filter the decoder does not implement was marked optional
/// and therefore skipped rather than causing the read to fail.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterWarning {
    pub filter_id: u16,
    pub filter_name: String,
}

pub struct Pipeline<'a> {
    filters: &'a [FilterDescription],
}

impl<'a> Pipeline<'a> {
    pub fn new(msg: &'a FilterPipelineMsg) -> Self {
        Pipeline { filters: &msg.filters }
    }

    /// Decode one chunk's stored bytes. `element_size` feeds the shuffle
    /// filter, which has no way to recover it from the buffer itself.
    pub fn decode_chunk(&self, data: &[u8], filter_mask: u32, element_size: usize) -> Result<(Vec<u8>, Vec<FilterWarning>)> {
        let mut buf = data.to_vec();
        let mut warnings = Vec::new();

        // Filters run in reverse of their pipeline order to undo the
        // forward (write-time) application.
        for (i, filter) in self.filters.iter().enumerate().rev() {
            let skipped = filter_mask & (1 << i) != 0;
            if skipped {
                continue;
            }
            match filter.id {
                FILTER_DEFLATE => buf = deflate::decode(&buf)?,
                FILTER_SHUFFLE => buf = shuffle::decode(&buf, element_size)?,
                FILTER_FLETCHER32 => buf = verify_and_strip_fletcher32(&buf)?,
                FILTER_SZIP | FILTER_NBIT | FILTER_SCALEOFFSET => {
                    return Err(Hdf5Error::unsupported_feature(
                        "filter pipeline",
                        format!("filter id {} ({})", filter.id, named_filter(filter.id)),
                    ));
                }
                other => {
                    if filter.is_optional() {
                        warnings.push(FilterWarning { filter_id: other, filter_name: filter.name.clone() });
                    } else {
                        return Err(Hdf5Error::unsupported_feature("filter pipeline", format!("unrecognised filter id {other}")));
                    }
                }
            }
        }

        Ok((buf, warnings))
    }
}

fn named_filter(id: u16) -> &'static str {
    match id {
        FILTER_SZIP => "szip",
        FILTER_NBIT => "n-bit",
        FILTER_SCALEOFFSET => "scale-offset",
        _ => "unknown",
    }
}

fn verify_and_strip_fletcher32(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 4 {
        return Err(Hdf5Error::malformed("fletcher32 filter", 0, "buffer too short to hold trailing checksum"));
    }
    let (body, trailer) = data.split_at(data.len() - 4);
    let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let computed = fletcher32(body);
    if expected != computed {
        return Err(Hdf5Error::ChecksumFailure { structure: "fletcher32 filter", offset: 0, expected, computed });
    }
    Ok(body.to_vec())
}
