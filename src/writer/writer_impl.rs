use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use super::config::WriterConfig;
use super::error::WriterError;
use super::stats::WriterStats;
use crate::column::ColumnStore;
use crate::compression::{builtin_compressor, Compressor};
use crate::file::{FileWriter, PositionedByteSink, TrackedSink};
use crate::record::{Record, RecordShredder};
use crate::schema::{MessageType, SchemaDescriptor};

/// Records between memory checks right after a row-group flush
const MINIMUM_RECORD_COUNT_FOR_CHECK: u64 = 100;

/// Streaming record writer: shred, buffer, flush row groups, finish
///
/// Composes the shredder, the column store and the file writer behind a
/// `write` / `finish` pair. Row groups are cut when buffered memory passes
/// the configured block size, measured on an adaptive cadence so
/// `mem_size` is not summed for every record.
///
/// Any error leaves the file without its footer; callers must discard the
/// output, the writer performs no cleanup of its own.
pub struct ParquetWriter<S: PositionedByteSink> {
    file: FileWriter<S>,
    store: ColumnStore,
    schema: MessageType,
    config: WriterConfig,
    record_count: u64,
    records_total: u64,
    row_groups: usize,
    next_mem_check: u64,
}

impl ParquetWriter<TrackedSink<BufWriter<File>>> {
    /// Create a writer to a file path, truncating any existing file
    pub fn new_file<P: AsRef<Path>>(
        path: P,
        schema: MessageType,
        config: WriterConfig,
    ) -> Result<Self, WriterError> {
        Self::new(TrackedSink::create(path)?, schema, config)
    }
}

impl<S: PositionedByteSink> ParquetWriter<S> {
    /// Create a writer using the built-in compressor for the configured codec
    pub fn new(sink: S, schema: MessageType, config: WriterConfig) -> Result<Self, WriterError> {
        let compressor = builtin_compressor(config.compression).ok_or_else(|| {
            WriterError::Config(format!(
                "no built-in compressor for {:?}; supply one with new_with_compressor",
                config.compression
            ))
        })?;
        Self::new_with_compressor(sink, schema, config, Arc::from(compressor))
    }

    /// Create a writer with a caller-provided compressor
    pub fn new_with_compressor(
        sink: S,
        schema: MessageType,
        config: WriterConfig,
        compressor: Arc<dyn Compressor>,
    ) -> Result<Self, WriterError> {
        let descriptor = SchemaDescriptor::new(schema.clone());
        let store = ColumnStore::new(&descriptor, &config, compressor);
        let mut file = FileWriter::new(sink, schema.clone(), Some(config.created_by.clone()));
        file.start()?;
        Ok(ParquetWriter {
            file,
            store,
            schema,
            config,
            record_count: 0,
            records_total: 0,
            row_groups: 0,
            next_mem_check: MINIMUM_RECORD_COUNT_FOR_CHECK,
        })
    }

    /// The schema this writer enforces
    pub fn schema(&self) -> &MessageType {
        &self.schema
    }

    /// Uncompressed bytes currently buffered across all columns
    pub fn buffered_memory(&self) -> usize {
        self.store.mem_size()
    }

    /// Shred and buffer one record, flushing a row group if memory demands
    pub fn write(&mut self, record: &Record) -> Result<(), WriterError> {
        self.store.start_record();
        RecordShredder::new(&self.schema).shred(record, &mut self.store)?;
        self.store.end_record();
        self.record_count += 1;
        self.records_total += 1;
        self.check_block_size()
    }

    /// Write every record of a source in order
    pub fn write_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a Record>,
    ) -> Result<(), WriterError> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    fn check_block_size(&mut self) -> Result<(), WriterError> {
        // measuring memory is relatively expensive, so not per record
        if self.record_count < self.next_mem_check {
            return Ok(());
        }
        let mem_size = self.store.mem_size();
        if mem_size > self.config.block_size {
            info!(
                "mem size {mem_size} > {}: flushing {} records to disk",
                self.config.block_size, self.record_count
            );
            self.flush_row_group()?;
        } else {
            let record_size = mem_size as f64 / self.record_count as f64;
            let projected = (self.config.block_size as f64 / record_size) as u64;
            self.next_mem_check =
                ((self.record_count + projected) / 2).max(MINIMUM_RECORD_COUNT_FOR_CHECK);
            debug!(
                "checked mem at {} records, next check at {}",
                self.record_count, self.next_mem_check
            );
        }
        Ok(())
    }

    fn flush_row_group(&mut self) -> Result<(), WriterError> {
        if self.store.row_count() == 0 {
            return Ok(());
        }
        self.store.flush(&mut self.file)?;
        self.row_groups += 1;
        self.record_count = 0;
        self.next_mem_check = MINIMUM_RECORD_COUNT_FOR_CHECK;
        Ok(())
    }

    /// Flush pending rows, write the footer and close the sink
    pub fn finish(&mut self) -> Result<WriterStats, WriterError> {
        self.flush_row_group()?;
        self.file.end(self.config.extra_metadata.clone())?;
        Ok(WriterStats {
            records_written: self.records_total,
            row_groups_written: self.row_groups,
            file_size_bytes: self.file.position(),
        })
    }

    /// Unwrap the sink; meaningful after [`ParquetWriter::finish`]
    pub fn into_inner(self) -> S {
        self.file.into_inner()
    }
}
