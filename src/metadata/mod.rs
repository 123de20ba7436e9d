//! # File Metadata
//!
//! The self-describing footer and the page headers, as structures
//! ([`FileMetaData`], [`RowGroupMetaData`], [`ColumnChunkMetaData`],
//! [`PageHeader`]) and as bytes ([`codec`]). The wire format is the Thrift
//! compact protocol with the interoperable field ids, produced and parsed
//! by a small in-crate protocol layer; round-tripping a footer through
//! parse and re-serialize is byte-identical.

pub mod codec;

pub(crate) mod thrift;


use crate::compression::CompressionCodec;
use crate::encoding::Encoding;
use crate::schema::{MessageType, PhysicalType, SchemaError};

/// Errors raised while serializing or parsing metadata
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The byte stream ended early
    #[error("truncated metadata: expected {0} more bytes")]
    Truncated(usize),

    /// A varint ran past 64 bits
    #[error("malformed varint in metadata")]
    MalformedVarInt,

    /// A field had an unexpected thrift wire type
    #[error("unexpected wire type {wire_type} for field {field}")]
    UnexpectedWireType {
        /// Field id within the enclosing struct
        field: i16,
        /// Thrift compact type code found
        wire_type: u8,
    },

    /// An enum code outside the known set
    #[error("unknown {kind} code {code}")]
    UnknownEnum {
        /// Which enum was being decoded
        kind: &'static str,
        /// The unrecognized code
        code: i32,
    },

    /// A required field was absent
    #[error("missing required footer field `{0}`")]
    MissingField(&'static str),

    /// The footer's schema list could not be rebuilt into a tree
    #[error("invalid schema in footer: {0}")]
    Schema(#[from] SchemaError),

    /// The trailing magic or length frame was wrong
    #[error("invalid footer framing")]
    BadFooterFrame,
}

/// A free-form key/value pair stored in the footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Metadata key
    pub key: String,
    /// Metadata value; keys may be written without one
    pub value: Option<String>,
}

/// Footer metadata for one column chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChunkMetaData {
    /// Path from the schema root to the leaf
    pub path: Vec<String>,
    /// Primitive type of the leaf
    pub physical_type: PhysicalType,
    /// Codec every page of the chunk was compressed with
    pub codec: CompressionCodec,
    /// Encodings used across the chunk's pages, sorted and deduplicated
    pub encodings: Vec<Encoding>,
    /// File offset of the first data page
    pub first_data_page_offset: i64,
    /// File offset of the dictionary page, if the chunk has one
    pub dictionary_page_offset: Option<i64>,
    /// Triples written to the chunk, nulls included
    pub num_values: i64,
    /// Page payload plus header bytes after compression
    pub total_compressed_size: i64,
    /// Page payload plus header bytes before compression
    pub total_uncompressed_size: i64,
}

impl ColumnChunkMetaData {
    /// Dictionary page offset with the conventional `-1` for "none"
    pub fn dictionary_page_offset_or_default(&self) -> i64 {
        self.dictionary_page_offset.unwrap_or(-1)
    }
}

/// Footer metadata for one row group
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroupMetaData {
    /// Column chunks in schema leaf order
    pub columns: Vec<ColumnChunkMetaData>,
    /// Complete rows in the group
    pub num_rows: i64,
    /// Total uncompressed bytes across the group's chunks
    pub total_byte_size: i64,
}

/// The file footer
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetaData {
    /// Format version, currently 1
    pub version: i32,
    /// The schema every row group conforms to
    pub schema: MessageType,
    /// Rows across all row groups
    pub num_rows: i64,
    /// Row groups in file order
    pub row_groups: Vec<RowGroupMetaData>,
    /// Application key/value metadata
    pub key_value_metadata: Vec<KeyValue>,
    /// Writer identification string
    pub created_by: Option<String>,
}

/// Page kinds a chunk can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Encoded values with their level streams
    DataPage,
    /// Reserved; never written by this crate
    IndexPage,
    /// The chunk's dictionary
    DictionaryPage,
}

impl PageType {
    pub(crate) fn code(self) -> i32 {
        match self {
            PageType::DataPage => 0,
            PageType::IndexPage => 1,
            PageType::DictionaryPage => 2,
        }
    }

    pub(crate) fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => PageType::DataPage,
            1 => PageType::IndexPage,
            2 => PageType::DictionaryPage,
            _ => return None,
        })
    }
}

/// Header fields specific to data pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPageHeader {
    /// Triples in the page, nulls included
    pub num_values: i32,
    /// Encoding of the value stream
    pub encoding: Encoding,
    /// Encoding of the definition level stream
    pub definition_level_encoding: Encoding,
    /// Encoding of the repetition level stream
    pub repetition_level_encoding: Encoding,
}

/// Header fields specific to dictionary pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryPageHeader {
    /// Entries in the dictionary
    pub num_values: i32,
    /// Encoding of the dictionary values
    pub encoding: Encoding,
    /// Whether entries are sorted; this writer never sorts
    pub is_sorted: bool,
}

/// The header framing every page in a chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    /// Page kind
    pub page_type: PageType,
    /// Payload size before compression
    pub uncompressed_page_size: i32,
    /// Payload size after compression
    pub compressed_page_size: i32,
    /// Optional payload checksum; not produced by this writer
    pub crc: Option<i32>,
    /// Present on data pages
    pub data_page_header: Option<DataPageHeader>,
    /// Present on dictionary pages
    pub dictionary_page_header: Option<DictionaryPageHeader>,
}
