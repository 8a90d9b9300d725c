//! Deflate filter (id 1): zlib-wrapped DEFLATE, decoded with `flate2`.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{Hdf5Error, Result};

pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Hdf5Error::malformed("deflate filter", 0, format!("zlib stream error: {e}")))?;
    Ok(out)
}
