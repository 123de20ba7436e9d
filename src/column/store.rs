use std::sync::Arc;

use log::debug;

use super::writer::ColumnWriter;
use crate::compression::Compressor;
use crate::file::{FileWriter, PositionedByteSink};
use crate::record::{ShredConsumer, Value};
use crate::schema::SchemaDescriptor;
use crate::writer::{WriterConfig, WriterError};

/// Smallest per-column accumulator capacity
const MINIMUM_BUFFER_SIZE: usize = 64 * 1024;

/// Fans shredded triples out to one [`ColumnWriter`] per leaf
///
/// The store lives for one row group: records come in through the
/// [`ShredConsumer`] hooks, `end_record` advances the row count, and
/// [`ColumnStore::flush`] writes every column's chunk to the file writer in
/// schema leaf order before resetting for the next group.
pub struct ColumnStore {
    columns: Vec<ColumnWriter>,
    row_count: i64,
}

impl ColumnStore {
    /// Build one column writer per leaf of `schema`
    pub fn new(
        schema: &SchemaDescriptor,
        config: &WriterConfig,
        compressor: Arc<dyn Compressor>,
    ) -> Self {
        // split the block budget across columns for the accumulators;
        // uneven columns will still grow past the hint
        let buffer_capacity_hint =
            MINIMUM_BUFFER_SIZE.max(config.block_size / schema.num_columns().max(1) / 5);
        let columns = schema
            .columns()
            .iter()
            .map(|descriptor| {
                ColumnWriter::new(
                    descriptor.clone(),
                    config,
                    Arc::clone(&compressor),
                    buffer_capacity_hint,
                )
            })
            .collect();
        ColumnStore {
            columns,
            row_count: 0,
        }
    }

    /// Begin one record; triples follow through the consumer hooks
    pub fn start_record(&mut self) {}

    /// Close one record, making its triples part of the group's row count
    pub fn end_record(&mut self) {
        self.row_count += 1;
    }

    /// Rows buffered in the current group
    pub fn row_count(&self) -> i64 {
        self.row_count
    }

    /// Uncompressed bytes buffered across all columns
    pub fn mem_size(&self) -> usize {
        self.columns.iter().map(ColumnWriter::mem_size).sum()
    }

    /// Flush the buffered row group to `file` and reset the store
    pub fn flush<S: PositionedByteSink>(
        &mut self,
        file: &mut FileWriter<S>,
    ) -> Result<(), WriterError> {
        debug!(
            "flushing {} rows across {} columns ({} buffered bytes)",
            self.row_count,
            self.columns.len(),
            self.mem_size()
        );
        file.start_block(self.row_count)?;
        for column in &mut self.columns {
            column.flush_chunk(file)?;
        }
        file.end_block()?;
        self.row_count = 0;
        Ok(())
    }
}

impl ShredConsumer for ColumnStore {
    fn write_value(
        &mut self,
        leaf: usize,
        value: &Value,
        rep: u16,
        def: u16,
    ) -> Result<(), WriterError> {
        self.columns[leaf].write_value(value, rep, def)
    }

    fn write_null(&mut self, leaf: usize, rep: u16, def: u16) -> Result<(), WriterError> {
        self.columns[leaf].write_null(rep, def)
    }
}
