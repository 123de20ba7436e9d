//! Repetition and definition level streams: width chosen from the maximum
//! level, RLE-hybrid payload behind a 4-byte little-endian length prefix.

use super::bytes_util::bits_needed;
use super::rle::RleHybridEncoder;
use super::{Encoding, EncodingError};

/// Encoder for one level stream of one column
///
/// A column whose maximum level is zero carries no level bytes at all; the
/// stream's encoding is then reported as `BIT_PACKED` and
/// [`LevelEncoder::page_bytes`] returns an empty buffer.
pub struct LevelEncoder {
    max_level: u16,
    encoder: Option<RleHybridEncoder>,
}

impl LevelEncoder {
    /// Create an encoder for levels in `0..=max_level`
    pub fn new(max_level: u16) -> Self {
        let encoder = (max_level > 0).then(|| {
            RleHybridEncoder::new(bits_needed(u32::from(max_level)))
                .expect("level widths are at most 16 bits")
        });
        LevelEncoder { max_level, encoder }
    }

    /// Append one level; levels for a zero-max stream are dropped
    pub fn put(&mut self, level: u16) -> Result<(), EncodingError> {
        match &mut self.encoder {
            Some(encoder) => encoder.write(u32::from(level)),
            None => Ok(()),
        }
    }

    /// Encoding tag recorded in data page headers for this stream
    pub fn encoding(&self) -> Encoding {
        if self.max_level == 0 {
            Encoding::BitPacked
        } else {
            Encoding::Rle
        }
    }

    /// Bytes buffered for the current page
    pub fn buffered_size(&self) -> usize {
        self.encoder
            .as_ref()
            .map_or(0, RleHybridEncoder::buffered_size)
    }

    /// Finalize the current page's stream and reset for the next page
    pub fn page_bytes(&mut self) -> Result<Vec<u8>, EncodingError> {
        match &mut self.encoder {
            None => Ok(Vec::new()),
            Some(encoder) => {
                let rle = encoder.finish()?;
                let mut bytes = Vec::with_capacity(4 + rle.len());
                bytes.extend_from_slice(&(rle.len() as u32).to_le_bytes());
                bytes.extend_from_slice(&rle);
                Ok(bytes)
            }
        }
    }
}
