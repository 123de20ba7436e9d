//! # High-Level Writer
//!
//! The user-facing surface of the crate: [`ParquetWriter`] takes records,
//! shreds them through the column store, cuts row groups against the
//! configured block size and terminates the file with its footer.
//!
//! ```rust,no_run
//! use parquetry::schema::{MessageType, PhysicalType, Repetition, SchemaNode};
//! use parquetry::record::Record;
//! use parquetry::writer::{ParquetWriter, WriterConfig};
//!
//! let schema = MessageType::new(
//!     "m",
//!     vec![SchemaNode::primitive("x", Repetition::Required, PhysicalType::Int32)],
//! )?;
//! let mut writer = ParquetWriter::new_file("out.parquet", schema, WriterConfig::default())?;
//! writer.write(&Record::new().with("x", 1))?;
//! writer.write(&Record::new().with("x", 2))?;
//! let stats = writer.finish()?;
//! println!("{stats}");
//! # Ok::<(), parquetry::writer::WriterError>(())
//! ```

mod config;
mod error;
mod stats;
mod writer_impl;


pub use config::WriterConfig;
pub use error::WriterError;
pub use stats::WriterStats;
pub use writer_impl::ParquetWriter;
