//! # parquetry - A Columnar File Format Write Path
//!
//! `parquetry` implements the write side of a columnar storage format from
//! the bytes up: nested records are shredded into per-column value and
//! level streams, encoded with compact codecs, grouped into pages and
//! column chunks, and emitted as row groups behind a self-describing
//! footer. Files are framed by the `PAR1` magic and carry their metadata
//! in the interoperable Thrift compact wire format, so standard columnar
//! tooling can read them back.
//!
//! ## Key Pieces
//!
//! - **Record shredding**: nested values become flat `(value, repetition
//!   level, definition level)` triples per leaf column, so repeated and
//!   optional structure survives columnar storage losslessly.
//!
//! - **Hybrid encoding**: level streams and dictionary ids use a
//!   run-length / bit-packed hybrid that collapses runs to a few bytes and
//!   packs irregular stretches eight values at a time.
//!
//! - **Dictionary encoding with fallback**: each column chunk deduplicates
//!   values into an insertion-ordered dictionary until a byte budget trips,
//!   then degrades to plain encoding for the rest of the chunk.
//!
//! - **Bounded memory**: row groups are cut when buffered bytes pass the
//!   configured block size, measured on an adaptive cadence; pages flush
//!   against their own soft bound the same way.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parquetry::prelude::*;
//!
//! let schema = MessageType::new(
//!     "telemetry",
//!     vec![
//!         SchemaNode::primitive("sensor", Repetition::Required, PhysicalType::Int64),
//!         SchemaNode::primitive("reading", Repetition::Optional, PhysicalType::Double),
//!     ],
//! )?;
//!
//! let mut writer = ParquetWriter::new_file(
//!     "telemetry.parquet",
//!     schema,
//!     WriterConfig::default(),
//! )?;
//!
//! writer.write(&Record::new().with("sensor", 7i64).with("reading", 21.5))?;
//! writer.write(&Record::new().with("sensor", 8i64))?;
//!
//! let stats = writer.finish()?;
//! println!("{stats}");
//! # Ok::<(), parquetry::writer::WriterError>(())
//! ```
//!
//! ## Architecture
//!
//! Data flows through the modules bottom-up:
//!
//! - [`schema`]: the immutable schema tree and its flattened leaf columns
//! - [`record`]: the dynamic record model and the shredding walk
//! - [`encoding`]: bit-packing, varints, the RLE hybrid, plain and
//!   dictionary value encoders, level streams
//! - [`column`]: per-leaf buffering, page framing and the row-group store
//! - [`compression`]: the `Compressor` seam and built-in codecs
//! - [`file`]: the sink abstraction and the file-level state machine
//! - [`metadata`]: footer and page-header structures and their wire codec
//! - [`writer`]: the high-level record writer tying everything together
//!
//! One writer owns one file; writers for different files are independent.
//! Aborting before `finish` leaves a truncated file without a footer,
//! which readers must treat as invalid.

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod column;
pub mod compression;
pub mod encoding;
pub mod file;
pub mod metadata;
pub mod record;
pub mod schema;
pub mod writer;

/// Re-export of the types most callers need
pub mod prelude {
    pub use crate::compression::{CompressionCodec, Compressor};
    pub use crate::file::{PositionedByteSink, TrackedSink};
    pub use crate::record::{Int96, Record, Value};
    pub use crate::schema::{MessageType, PhysicalType, Repetition, SchemaNode};
    pub use crate::writer::{ParquetWriter, WriterConfig, WriterError, WriterStats};
}
