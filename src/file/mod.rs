//! # File Assembly
//!
//! The bottom of the write path: [`PositionedByteSink`] abstracts the
//! seekable output, and [`FileWriter`] drives the strict
//! `file → row group → column chunk → page` state machine, tracking
//! offsets and accumulating the metadata that [`FileWriter::end`] serializes
//! into the footer. Calls outside the legal order fail with
//! `WriterError::IllegalState` before any byte is written.

mod sink;
mod writer;

#[cfg(test)]
mod tests;

pub use sink::{PositionedByteSink, TrackedSink};
pub use writer::{FileWriter, MAGIC};
