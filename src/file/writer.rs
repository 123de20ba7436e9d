use std::collections::BTreeSet;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use super::sink::PositionedByteSink;
use crate::column::CompressedDictionaryPage;
use crate::compression::CompressionCodec;
use crate::encoding::Encoding;
use crate::metadata::codec::{serialize_footer, serialize_page_header};
use crate::metadata::{
    ColumnChunkMetaData, DataPageHeader, DictionaryPageHeader, FileMetaData, KeyValue, PageHeader,
    PageType, RowGroupMetaData,
};
use crate::schema::{ColumnDescriptor, MessageType, PhysicalType};
use crate::writer::WriterError;

/// The four bytes framing every file
pub const MAGIC: &[u8; 4] = b"PAR1";

/// Footer format version this writer produces
const FORMAT_VERSION: i32 = 1;

/// Writer lifecycle; captures the order in which methods may be called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    Started,
    Block,
    Column,
    Ended,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::NotStarted => "NotStarted",
            State::Started => "Started",
            State::Block => "Block",
            State::Column => "Column",
            State::Ended => "Ended",
        }
    }
}

/// Offsets and totals gathered for the column chunk being written
struct ChunkState {
    path: Vec<String>,
    physical_type: PhysicalType,
    codec: CompressionCodec,
    value_count: i64,
    first_data_page_offset: i64,
    dictionary_page_offset: Option<i64>,
    uncompressed_length: i64,
    compressed_length: i64,
    encodings: BTreeSet<Encoding>,
}

/// Emits one file: magic, row groups of column chunks, footer
///
/// Methods must follow
/// `start → (start_block → (start_column → write… → end_column)… → end_block)… → end`;
/// any other order fails with `IllegalState` and leaves the sink untouched.
/// The writer tracks sink offsets as pages go out and assembles the footer
/// metadata `end` serializes.
pub struct FileWriter<S: PositionedByteSink> {
    sink: S,
    schema: MessageType,
    created_by: Option<String>,
    state: State,
    row_groups: Vec<RowGroupMetaData>,
    total_rows: i64,
    block_columns: Vec<ColumnChunkMetaData>,
    block_row_count: i64,
    block_total_byte_size: i64,
    chunk: Option<ChunkState>,
}

impl<S: PositionedByteSink> FileWriter<S> {
    /// Create a writer over `sink`; nothing is written until [`FileWriter::start`]
    pub fn new(sink: S, schema: MessageType, created_by: Option<String>) -> Self {
        FileWriter {
            sink,
            schema,
            created_by,
            state: State::NotStarted,
            row_groups: Vec::new(),
            total_rows: 0,
            block_columns: Vec::new(),
            block_row_count: 0,
            block_total_byte_size: 0,
            chunk: None,
        }
    }

    /// Current sink position
    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    /// Unwrap the sink, discarding writer state
    pub fn into_inner(self) -> S {
        self.sink
    }

    fn illegal(&self, operation: &'static str) -> WriterError {
        WriterError::IllegalState {
            state: self.state.name(),
            operation,
        }
    }

    /// Write the leading magic
    pub fn start(&mut self) -> Result<(), WriterError> {
        if self.state != State::NotStarted {
            return Err(self.illegal("start"));
        }
        debug!("{}: start", self.sink.position());
        self.sink.write_all(MAGIC)?;
        self.state = State::Started;
        Ok(())
    }

    /// Open a row group that will hold `record_count` rows
    pub fn start_block(&mut self, record_count: i64) -> Result<(), WriterError> {
        if self.state != State::Started {
            return Err(self.illegal("start_block"));
        }
        debug!("{}: start block", self.sink.position());
        self.block_columns = Vec::new();
        self.block_row_count = record_count;
        self.block_total_byte_size = 0;
        self.state = State::Block;
        Ok(())
    }

    /// Open the next column chunk of the current row group
    pub fn start_column(
        &mut self,
        descriptor: &ColumnDescriptor,
        value_count: i64,
        codec: CompressionCodec,
    ) -> Result<(), WriterError> {
        if self.state != State::Block {
            return Err(self.illegal("start_column"));
        }
        debug!(
            "{}: start column {} count={value_count}",
            self.sink.position(),
            descriptor.dotted_path()
        );
        self.chunk = Some(ChunkState {
            path: descriptor.path().to_vec(),
            physical_type: descriptor.physical_type(),
            codec,
            value_count,
            first_data_page_offset: self.sink.position() as i64,
            dictionary_page_offset: None,
            uncompressed_length: 0,
            compressed_length: 0,
            encodings: BTreeSet::new(),
        });
        self.state = State::Column;
        Ok(())
    }

    /// Write the chunk's dictionary page; must precede its data pages
    pub fn write_dictionary_page(
        &mut self,
        page: &CompressedDictionaryPage,
    ) -> Result<(), WriterError> {
        if self.state != State::Column {
            return Err(self.illegal("write_dictionary_page"));
        }
        debug!(
            "{}: write dictionary page: {} values",
            self.sink.position(),
            page.num_values
        );
        let offset = self.sink.position() as i64;
        let header = serialize_page_header(&PageHeader {
            page_type: PageType::DictionaryPage,
            uncompressed_page_size: page.uncompressed_size as i32,
            compressed_page_size: page.buffer.len() as i32,
            crc: None,
            data_page_header: None,
            dictionary_page_header: Some(DictionaryPageHeader {
                num_values: page.num_values as i32,
                encoding: page.encoding,
                is_sorted: false,
            }),
        });
        self.sink.write_all(&header)?;
        self.sink.write_all(&page.buffer)?;
        let chunk = self.chunk.as_mut().expect("column state implies a chunk");
        chunk.dictionary_page_offset = Some(offset);
        chunk.uncompressed_length += (page.uncompressed_size + header.len()) as i64;
        chunk.compressed_length += (page.buffer.len() + header.len()) as i64;
        chunk.encodings.insert(page.encoding);
        Ok(())
    }

    /// Write one data page: header then compressed payload
    #[allow(clippy::too_many_arguments)]
    pub fn write_data_page(
        &mut self,
        value_count: i32,
        uncompressed_size: usize,
        bytes: &[u8],
        rep_level_encoding: Encoding,
        def_level_encoding: Encoding,
        values_encoding: Encoding,
    ) -> Result<(), WriterError> {
        if self.state != State::Column {
            return Err(self.illegal("write_data_page"));
        }
        debug!(
            "{}: write data page: {value_count} values",
            self.sink.position()
        );
        let header = serialize_page_header(&PageHeader {
            page_type: PageType::DataPage,
            uncompressed_page_size: uncompressed_size as i32,
            compressed_page_size: bytes.len() as i32,
            crc: None,
            data_page_header: Some(DataPageHeader {
                num_values: value_count,
                encoding: values_encoding,
                definition_level_encoding: def_level_encoding,
                repetition_level_encoding: rep_level_encoding,
            }),
            dictionary_page_header: None,
        });
        self.sink.write_all(&header)?;
        self.sink.write_all(bytes)?;
        let chunk = self.chunk.as_mut().expect("column state implies a chunk");
        chunk.uncompressed_length += (uncompressed_size + header.len()) as i64;
        chunk.compressed_length += (bytes.len() + header.len()) as i64;
        chunk.encodings.insert(rep_level_encoding);
        chunk.encodings.insert(def_level_encoding);
        chunk.encodings.insert(values_encoding);
        Ok(())
    }

    /// Write a pre-assembled run of data pages, headers included
    ///
    /// `total_uncompressed_size` and `total_compressed_size` cover payloads
    /// only; header bytes are inferred from the buffer length.
    pub fn write_data_pages(
        &mut self,
        bytes: &[u8],
        total_uncompressed_size: i64,
        total_compressed_size: i64,
        encodings: impl IntoIterator<Item = Encoding>,
    ) -> Result<(), WriterError> {
        if self.state != State::Column {
            return Err(self.illegal("write_data_pages"));
        }
        debug!("{}: write data pages", self.sink.position());
        let headers_size = bytes.len() as i64 - total_compressed_size;
        self.sink.write_all(bytes)?;
        let chunk = self.chunk.as_mut().expect("column state implies a chunk");
        chunk.uncompressed_length += total_uncompressed_size + headers_size;
        chunk.compressed_length += total_compressed_size + headers_size;
        chunk.encodings.extend(encodings);
        Ok(())
    }

    /// Close the current column chunk and record its metadata
    pub fn end_column(&mut self) -> Result<(), WriterError> {
        if self.state != State::Column {
            return Err(self.illegal("end_column"));
        }
        debug!("{}: end column", self.sink.position());
        let chunk = self.chunk.take().expect("column state implies a chunk");
        self.block_total_byte_size += chunk.uncompressed_length;
        self.block_columns.push(ColumnChunkMetaData {
            path: chunk.path,
            physical_type: chunk.physical_type,
            codec: chunk.codec,
            encodings: chunk.encodings.into_iter().collect(),
            first_data_page_offset: chunk.first_data_page_offset,
            dictionary_page_offset: chunk.dictionary_page_offset,
            num_values: chunk.value_count,
            total_compressed_size: chunk.compressed_length,
            total_uncompressed_size: chunk.uncompressed_length,
        });
        self.state = State::Block;
        Ok(())
    }

    /// Close the current row group
    pub fn end_block(&mut self) -> Result<(), WriterError> {
        if self.state != State::Block {
            return Err(self.illegal("end_block"));
        }
        debug!("{}: end block", self.sink.position());
        self.row_groups.push(RowGroupMetaData {
            columns: std::mem::take(&mut self.block_columns),
            num_rows: self.block_row_count,
            total_byte_size: self.block_total_byte_size,
        });
        self.total_rows += self.block_row_count;
        self.state = State::Started;
        Ok(())
    }

    /// Write the footer and close the sink
    ///
    /// The footer bytes are followed by their little-endian length and the
    /// trailing magic. Returns the metadata that was serialized.
    pub fn end(&mut self, key_value_metadata: Vec<KeyValue>) -> Result<FileMetaData, WriterError> {
        if self.state != State::Started {
            return Err(self.illegal("end"));
        }
        debug!("{}: end", self.sink.position());
        let metadata = FileMetaData {
            version: FORMAT_VERSION,
            schema: self.schema.clone(),
            num_rows: self.total_rows,
            row_groups: std::mem::take(&mut self.row_groups),
            key_value_metadata,
            created_by: self.created_by.clone(),
        };
        let footer_start = self.sink.position();
        let footer = serialize_footer(&metadata);
        self.sink.write_all(&footer)?;
        let footer_len = self.sink.position() - footer_start;
        debug!("{}: footer length = {footer_len}", self.sink.position());
        let mut len_bytes = [0u8; 4];
        LittleEndian::write_u32(&mut len_bytes, footer_len as u32);
        self.sink.write_all(&len_bytes)?;
        self.sink.write_all(MAGIC)?;
        self.sink.close()?;
        self.state = State::Ended;
        Ok(metadata)
    }
}
