use bytes::Bytes;

use crate::encoding::Encoding;

/// A dictionary page after compression, held until its chunk is flushed
///
/// The dictionary must be the first page of its chunk in the file, but it
/// is only complete once the chunk's last value has been seen, so the page
/// writer keeps it here while data pages accumulate.
#[derive(Debug, Clone)]
pub struct CompressedDictionaryPage {
    /// Compressed PLAIN encoding of the dictionary values
    pub buffer: Bytes,
    /// Size of the dictionary body before compression
    pub uncompressed_size: usize,
    /// Number of dictionary entries
    pub num_values: u32,
    /// Encoding recorded in the page header
    pub encoding: Encoding,
}

/// One column chunk's accumulated pages, ready for the file writer
#[derive(Debug)]
pub(crate) struct ChunkPages {
    /// Concatenated page headers and compressed payloads
    pub buffer: Bytes,
    /// Dictionary page to write ahead of `buffer`, if any
    pub dictionary: Option<CompressedDictionaryPage>,
    /// Sum of payload sizes before compression, headers excluded
    pub total_uncompressed_size: i64,
    /// Sum of payload sizes after compression, headers excluded
    pub total_compressed_size: i64,
    /// Encodings used across the chunk's pages
    pub encodings: Vec<Encoding>,
}
