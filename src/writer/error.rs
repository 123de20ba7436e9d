use crate::encoding::EncodingError;
use crate::metadata::MetadataError;
use crate::record::RecordError;
use crate::schema::SchemaError;

/// Errors surfaced by the write path
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// Sink or compressor I/O failure; the file must be assumed corrupt
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file-writer method was called out of order
    #[error("operation `{operation}` is illegal in state {state}")]
    IllegalState {
        /// State the writer was in
        state: &'static str,
        /// The rejected operation
        operation: &'static str,
    },

    /// A record did not match the schema
    #[error("invalid record: {0}")]
    Record(#[from] RecordError),

    /// A value stream could not be encoded
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Footer or page-header serialization failed
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// The schema itself was rejected
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The writer configuration cannot be honored
    #[error("configuration error: {0}")]
    Config(String),
}
