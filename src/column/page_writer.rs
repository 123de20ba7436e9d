use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};

use super::page::{ChunkPages, CompressedDictionaryPage};
use crate::compression::Compressor;
use crate::encoding::{DictionaryPage, Encoding};
use crate::metadata::codec::serialize_page_header;
use crate::metadata::{DataPageHeader, PageHeader, PageType};
use crate::writer::WriterError;

/// Compresses and frames finished pages for one column chunk
///
/// Data pages are appended to an in-memory accumulator as
/// `header ++ compressed payload`; the dictionary page, which must lead the
/// chunk on disk, is compressed and held aside. Totals cover payload bytes
/// only; the file writer adds header sizes when it ingests the buffer.
pub struct PageWriter {
    compressor: Arc<dyn Compressor>,
    buffer: BytesMut,
    dictionary: Option<CompressedDictionaryPage>,
    total_uncompressed_size: i64,
    total_compressed_size: i64,
    encodings: BTreeSet<Encoding>,
}

impl PageWriter {
    /// Create a page writer; `buffer_capacity_hint` sizes the accumulator
    pub fn new(compressor: Arc<dyn Compressor>, buffer_capacity_hint: usize) -> Self {
        PageWriter {
            compressor,
            buffer: BytesMut::with_capacity(buffer_capacity_hint),
            dictionary: None,
            total_uncompressed_size: 0,
            total_compressed_size: 0,
            encodings: BTreeSet::new(),
        }
    }

    /// Compress and frame one data page into the chunk accumulator
    pub fn write_data_page(
        &mut self,
        payload: &[u8],
        value_count: i32,
        rep_level_encoding: Encoding,
        def_level_encoding: Encoding,
        values_encoding: Encoding,
    ) -> Result<(), WriterError> {
        let compressed = self.compressor.compress(payload)?;
        let header = serialize_page_header(&PageHeader {
            page_type: PageType::DataPage,
            uncompressed_page_size: payload.len() as i32,
            compressed_page_size: compressed.len() as i32,
            crc: None,
            data_page_header: Some(DataPageHeader {
                num_values: value_count,
                encoding: values_encoding,
                definition_level_encoding: def_level_encoding,
                repetition_level_encoding: rep_level_encoding,
            }),
            dictionary_page_header: None,
        });
        self.buffer.put_slice(&header);
        self.buffer.put_slice(&compressed);
        self.total_uncompressed_size += payload.len() as i64;
        self.total_compressed_size += compressed.len() as i64;
        self.encodings.insert(rep_level_encoding);
        self.encodings.insert(def_level_encoding);
        self.encodings.insert(values_encoding);
        Ok(())
    }

    /// Compress the chunk's dictionary page and hold it for the flush
    pub fn write_dictionary_page(&mut self, page: DictionaryPage) -> Result<(), WriterError> {
        let compressed = self.compressor.compress(&page.buffer)?;
        self.dictionary = Some(CompressedDictionaryPage {
            buffer: compressed.into(),
            uncompressed_size: page.buffer.len(),
            num_values: page.num_values,
            encoding: page.encoding,
        });
        self.encodings.insert(page.encoding);
        Ok(())
    }

    /// Bytes accumulated for the chunk so far, the held dictionary included
    pub fn buffered_size(&self) -> usize {
        self.buffer.len()
            + self
                .dictionary
                .as_ref()
                .map_or(0, |dictionary| dictionary.buffer.len())
    }

    /// Hand over the accumulated chunk and reset for the next row group
    pub(crate) fn take_chunk(&mut self) -> ChunkPages {
        ChunkPages {
            buffer: self.buffer.split().freeze(),
            dictionary: self.dictionary.take(),
            total_uncompressed_size: std::mem::take(&mut self.total_uncompressed_size),
            total_compressed_size: std::mem::take(&mut self.total_compressed_size),
            encodings: std::mem::take(&mut self.encodings).into_iter().collect(),
        }
    }

    /// Codec every page of this chunk is compressed with
    pub fn codec(&self) -> crate::compression::CompressionCodec {
        self.compressor.codec()
    }
}
