//! # Compression
//!
//! Pages are compressed through the [`Compressor`] trait; codec
//! implementations are collaborators, not part of the write path. The crate
//! ships a pass-through [`Uncompressed`] codec and a [`Gzip`] codec backed
//! by `flate2`. SNAPPY and LZO keep their wire codes so footers referencing
//! them parse, but selecting one requires plugging in an implementation via
//! [`Compressor`].

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;

/// Compression codecs a column chunk can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionCodec {
    /// No compression
    #[default]
    Uncompressed,
    /// Snappy block format
    Snappy,
    /// Gzip (DEFLATE with gzip framing)
    Gzip,
    /// LZO
    Lzo,
}

impl CompressionCodec {
    /// Integer code used in the footer wire format
    pub(crate) fn code(self) -> i32 {
        match self {
            CompressionCodec::Uncompressed => 0,
            CompressionCodec::Snappy => 1,
            CompressionCodec::Gzip => 2,
            CompressionCodec::Lzo => 3,
        }
    }

    /// Inverse of [`CompressionCodec::code`]
    pub(crate) fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => CompressionCodec::Uncompressed,
            1 => CompressionCodec::Snappy,
            2 => CompressionCodec::Gzip,
            3 => CompressionCodec::Lzo,
            _ => return None,
        })
    }
}

/// Compresses page payloads
///
/// Implementations are stateless from the writer's point of view; the
/// writer calls [`Compressor::compress`] once per page and records the
/// codec name in chunk metadata.
pub trait Compressor {
    /// Compress one page payload
    fn compress(&self, bytes: &[u8]) -> io::Result<Vec<u8>>;

    /// The codec this compressor implements
    fn codec(&self) -> CompressionCodec;
}

/// Pass-through codec
#[derive(Debug, Default, Clone, Copy)]
pub struct Uncompressed;

impl Compressor for Uncompressed {
    fn compress(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn codec(&self) -> CompressionCodec {
        CompressionCodec::Uncompressed
    }
}

/// Gzip codec backed by `flate2`
#[derive(Debug, Clone, Copy)]
pub struct Gzip {
    level: u32,
}

impl Gzip {
    /// Gzip at an explicit level, 0..=9
    pub fn new(level: u32) -> Self {
        Gzip { level: level.min(9) }
    }
}

impl Default for Gzip {
    fn default() -> Self {
        Gzip { level: 6 }
    }
}

impl Compressor for Gzip {
    fn compress(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), GzLevel::new(self.level));
        encoder.write_all(bytes)?;
        encoder.finish()
    }

    fn codec(&self) -> CompressionCodec {
        CompressionCodec::Gzip
    }
}

/// Built-in compressor for `codec`, if the crate ships one
pub fn builtin_compressor(codec: CompressionCodec) -> Option<Box<dyn Compressor>> {
    match codec {
        CompressionCodec::Uncompressed => Some(Box::new(Uncompressed)),
        CompressionCodec::Gzip => Some(Box::new(Gzip::default())),
        CompressionCodec::Snappy | CompressionCodec::Lzo => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_uncompressed_is_identity() {
        let bytes = b"columnar".to_vec();
        assert_eq!(Uncompressed.compress(&bytes).unwrap(), bytes);
    }

    #[test]
    fn test_gzip_round_trips() {
        let bytes: Vec<u8> = std::iter::repeat(b"abcd".as_slice())
            .take(256)
            .flatten()
            .copied()
            .collect();
        let compressed = Gzip::default().compress(&bytes).unwrap();
        assert!(compressed.len() < bytes.len());

        let mut decoder = flate2::read::GzDecoder::new(compressed.as_slice());
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_builtin_compressors() {
        assert!(builtin_compressor(CompressionCodec::Uncompressed).is_some());
        assert!(builtin_compressor(CompressionCodec::Gzip).is_some());
        assert!(builtin_compressor(CompressionCodec::Snappy).is_none());
    }
}
