use crate::compression::CompressionCodec;
use crate::metadata::KeyValue;

/// Configuration for the write path
///
/// Sizes are soft bounds: the row-group bound is checked on an adaptive
/// record cadence and the page bound on a projected value cadence, so
/// buffers can overshoot by roughly one check interval.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Target uncompressed size of one row group
    pub block_size: usize,

    /// Target uncompressed size of one data page
    pub page_size: usize,

    /// Dictionary byte budget per column chunk; exceeding it falls the
    /// chunk back to plain encoding
    pub dictionary_page_size: usize,

    /// Whether value columns may use dictionary encoding at all
    pub enable_dictionary: bool,

    /// Codec pages are compressed with
    pub compression: CompressionCodec,

    /// Enable redundant level assertions while writing
    pub validating: bool,

    /// Writer identification recorded in the footer
    pub created_by: String,

    /// Application key/value pairs for the footer
    pub extra_metadata: Vec<KeyValue>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            // 128 MiB row groups, 1 MiB pages
            block_size: 128 * 1024 * 1024,
            page_size: 1024 * 1024,
            dictionary_page_size: 1024 * 1024,
            enable_dictionary: true,
            compression: CompressionCodec::Uncompressed,
            validating: false,
            created_by: concat!("parquetry version ", env!("CARGO_PKG_VERSION")).to_string(),
            extra_metadata: Vec::new(),
        }
    }
}

impl WriterConfig {
    /// Default sizes with gzip page compression
    pub fn gzip() -> Self {
        WriterConfig {
            compression: CompressionCodec::Gzip,
            ..Self::default()
        }
    }

    /// Set the row-group size bound
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the page size bound
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the per-chunk dictionary budget
    pub fn with_dictionary_page_size(mut self, size: usize) -> Self {
        self.dictionary_page_size = size;
        self
    }

    /// Force plain encoding everywhere
    pub fn without_dictionary(mut self) -> Self {
        self.enable_dictionary = false;
        self
    }

    /// Set the page compression codec
    pub fn with_compression(mut self, compression: CompressionCodec) -> Self {
        self.compression = compression;
        self
    }

    /// Enable redundant schema and level assertions
    pub fn with_validation(mut self) -> Self {
        self.validating = true;
        self
    }

    /// Attach one footer key/value pair
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_metadata.push(KeyValue {
            key: key.into(),
            value: Some(value.into()),
        });
        self
    }
}
