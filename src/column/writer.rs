use std::sync::Arc;

use super::page_writer::PageWriter;
use crate::compression::Compressor;
use crate::encoding::{
    DictionaryEncoder, DictionaryPage, Encoding, EncodingError, LevelEncoder, PlainEncoder,
};
use crate::file::{FileWriter, PositionedByteSink};
use crate::record::{RecordError, Value};
use crate::schema::{ColumnDescriptor, PhysicalType};
use crate::writer::{WriterConfig, WriterError};

/// First size check happens after this many values
const INITIAL_COUNT_FOR_SIZE_CHECK: u32 = 100;

/// The column's value encoder: plain, or dictionary until it falls back
enum ValuesWriter {
    Plain(PlainEncoder),
    Dictionary(DictionaryEncoder),
}

impl ValuesWriter {
    fn new(physical_type: PhysicalType, enable_dictionary: bool, dictionary_budget: usize) -> Self {
        // booleans are already one bit each, a dictionary cannot help
        if enable_dictionary && physical_type != PhysicalType::Boolean {
            ValuesWriter::Dictionary(DictionaryEncoder::new(dictionary_budget))
        } else {
            ValuesWriter::Plain(PlainEncoder::new())
        }
    }

    fn buffered_size(&self) -> usize {
        match self {
            ValuesWriter::Plain(encoder) => encoder.buffered_size(),
            ValuesWriter::Dictionary(encoder) => encoder.buffered_size(),
        }
    }

    fn allocated_size(&self) -> usize {
        match self {
            ValuesWriter::Plain(encoder) => encoder.buffered_size(),
            ValuesWriter::Dictionary(encoder) => encoder.allocated_size(),
        }
    }

    fn page_bytes(&mut self) -> Result<(Vec<u8>, Encoding), EncodingError> {
        match self {
            ValuesWriter::Plain(encoder) => Ok((encoder.finish(), Encoding::Plain)),
            ValuesWriter::Dictionary(encoder) => encoder.page_bytes(),
        }
    }

    fn dictionary_page(&mut self) -> Option<DictionaryPage> {
        match self {
            ValuesWriter::Plain(_) => None,
            ValuesWriter::Dictionary(encoder) => encoder.dictionary_page(),
        }
    }
}

/// Buffers one leaf column's values and level streams, flushing pages
///
/// Values and levels accumulate until the buffered payload passes the page
/// size, checked on a projected schedule rather than per value; the store
/// forces a final flush at row-group boundaries via
/// [`ColumnWriter::flush_chunk`], which also resets the dictionary for the
/// next chunk.
pub struct ColumnWriter {
    descriptor: ColumnDescriptor,
    rep_levels: LevelEncoder,
    def_levels: LevelEncoder,
    values: ValuesWriter,
    page_writer: PageWriter,
    page_size: usize,
    dictionary_page_size: usize,
    enable_dictionary: bool,
    validating: bool,
    value_count: u32,
    next_size_check: u32,
    chunk_value_count: i64,
}

impl ColumnWriter {
    /// Create a writer for `descriptor` under the given configuration
    pub fn new(
        descriptor: ColumnDescriptor,
        config: &WriterConfig,
        compressor: Arc<dyn Compressor>,
        buffer_capacity_hint: usize,
    ) -> Self {
        let values = ValuesWriter::new(
            descriptor.physical_type(),
            config.enable_dictionary,
            config.dictionary_page_size,
        );
        ColumnWriter {
            rep_levels: LevelEncoder::new(descriptor.max_rep_level()),
            def_levels: LevelEncoder::new(descriptor.max_def_level()),
            values,
            page_writer: PageWriter::new(compressor, buffer_capacity_hint),
            page_size: config.page_size,
            dictionary_page_size: config.dictionary_page_size,
            enable_dictionary: config.enable_dictionary,
            validating: config.validating,
            value_count: 0,
            next_size_check: INITIAL_COUNT_FOR_SIZE_CHECK,
            chunk_value_count: 0,
            descriptor,
        }
    }

    /// The descriptor this writer serves
    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    /// Record a null: levels only
    pub fn write_null(&mut self, rep: u16, def: u16) -> Result<(), WriterError> {
        if self.validating {
            self.check_levels(rep, def, false)?;
        }
        self.rep_levels.put(rep)?;
        self.def_levels.put(def)?;
        self.account_value()
    }

    /// Record a present value with its levels
    pub fn write_value(&mut self, value: &Value, rep: u16, def: u16) -> Result<(), WriterError> {
        if self.validating {
            self.check_levels(rep, def, true)?;
        }
        match (self.descriptor.physical_type(), value) {
            (PhysicalType::Boolean, Value::Bool(v)) => match &mut self.values {
                ValuesWriter::Plain(encoder) => encoder.write_bool(*v),
                // construction never picks a dictionary for booleans
                ValuesWriter::Dictionary(_) => unreachable!("boolean dictionary"),
            },
            (PhysicalType::Int32, Value::Int32(v)) => match &mut self.values {
                ValuesWriter::Plain(encoder) => encoder.write_i32(*v),
                ValuesWriter::Dictionary(encoder) => encoder.write_i32(*v),
            },
            (PhysicalType::Int64, Value::Int64(v)) => match &mut self.values {
                ValuesWriter::Plain(encoder) => encoder.write_i64(*v),
                ValuesWriter::Dictionary(encoder) => encoder.write_i64(*v),
            },
            (PhysicalType::Int96, Value::Int96(v)) => match &mut self.values {
                ValuesWriter::Plain(encoder) => encoder.write_int96(*v),
                ValuesWriter::Dictionary(encoder) => encoder.write_int96(*v),
            },
            (PhysicalType::Float, Value::Float(v)) => match &mut self.values {
                ValuesWriter::Plain(encoder) => encoder.write_f32(*v),
                ValuesWriter::Dictionary(encoder) => encoder.write_f32(*v),
            },
            (PhysicalType::Double, Value::Double(v)) => match &mut self.values {
                ValuesWriter::Plain(encoder) => encoder.write_f64(*v),
                ValuesWriter::Dictionary(encoder) => encoder.write_f64(*v),
            },
            (PhysicalType::ByteArray, Value::Bytes(bytes)) => match &mut self.values {
                ValuesWriter::Plain(encoder) => encoder.write_bytes(bytes),
                ValuesWriter::Dictionary(encoder) => encoder.write_bytes(bytes),
            },
            (PhysicalType::FixedLenByteArray, Value::Bytes(bytes)) => {
                if bytes.len() != self.descriptor.type_length() {
                    return Err(RecordError::FixedLenMismatch {
                        path: self.descriptor.dotted_path(),
                        expected: self.descriptor.type_length(),
                        actual: bytes.len(),
                    }
                    .into());
                }
                match &mut self.values {
                    ValuesWriter::Plain(encoder) => encoder.write_fixed_bytes(bytes),
                    ValuesWriter::Dictionary(encoder) => encoder.write_fixed_bytes(bytes),
                }
            }
            (expected, _) => {
                return Err(RecordError::TypeMismatch {
                    path: self.descriptor.dotted_path(),
                    expected,
                }
                .into())
            }
        }
        self.rep_levels.put(rep)?;
        self.def_levels.put(def)?;
        self.account_value()
    }

    fn check_levels(&self, rep: u16, def: u16, present: bool) -> Result<(), RecordError> {
        if rep > self.descriptor.max_rep_level() {
            return Err(RecordError::LevelOutOfRange {
                kind: "repetition",
                level: rep,
                max: self.descriptor.max_rep_level(),
                path: self.descriptor.dotted_path(),
            });
        }
        let max_def = self.descriptor.max_def_level();
        // a triple carries a value exactly at the maximum definition level
        let def_ok = if present { def == max_def } else { def < max_def };
        if def > max_def || !def_ok {
            return Err(RecordError::LevelOutOfRange {
                kind: "definition",
                level: def,
                max: max_def,
                path: self.descriptor.dotted_path(),
            });
        }
        Ok(())
    }

    fn account_value(&mut self) -> Result<(), WriterError> {
        self.value_count += 1;
        self.chunk_value_count += 1;
        if self.value_count >= self.next_size_check {
            let size = self.buffered_page_size();
            if size > self.page_size {
                self.next_size_check = (self.value_count / 2).max(1);
                self.flush_page()?;
            } else {
                // project the count where the page bound would trip, check halfway
                let projected =
                    (self.value_count as u64 * self.page_size as u64 / size.max(1) as u64) as u32;
                self.next_size_check = (self.value_count + projected) / 2 + 1;
            }
        }
        Ok(())
    }

    fn buffered_page_size(&self) -> usize {
        self.rep_levels.buffered_size()
            + self.def_levels.buffered_size()
            + self.values.buffered_size()
    }

    /// Bytes this column holds in memory, accumulated pages included
    pub fn mem_size(&self) -> usize {
        self.rep_levels.buffered_size()
            + self.def_levels.buffered_size()
            + self.values.allocated_size()
            + self.page_writer.buffered_size()
    }

    /// Finalize the current page, if it holds any triples
    ///
    /// Payload layout is the repetition stream, the definition stream, then
    /// the value bytes; the level streams carry their own length prefixes.
    pub fn flush_page(&mut self) -> Result<(), WriterError> {
        if self.value_count == 0 {
            return Ok(());
        }
        let rep = self.rep_levels.page_bytes()?;
        let def = self.def_levels.page_bytes()?;
        let (values, values_encoding) = self.values.page_bytes()?;
        let mut payload = Vec::with_capacity(rep.len() + def.len() + values.len());
        payload.extend_from_slice(&rep);
        payload.extend_from_slice(&def);
        payload.extend_from_slice(&values);
        self.page_writer.write_data_page(
            &payload,
            self.value_count as i32,
            self.rep_levels.encoding(),
            self.def_levels.encoding(),
            values_encoding,
        )?;
        self.value_count = 0;
        Ok(())
    }

    /// Flush the whole chunk to the file writer and reset for the next one
    pub fn flush_chunk<S: PositionedByteSink>(
        &mut self,
        file: &mut FileWriter<S>,
    ) -> Result<(), WriterError> {
        self.flush_page()?;
        if let Some(dictionary) = self.values.dictionary_page() {
            self.page_writer.write_dictionary_page(dictionary)?;
        }
        let chunk = self.page_writer.take_chunk();
        file.start_column(&self.descriptor, self.chunk_value_count, self.page_writer.codec())?;
        if let Some(dictionary) = &chunk.dictionary {
            file.write_dictionary_page(dictionary)?;
        }
        file.write_data_pages(
            &chunk.buffer,
            chunk.total_uncompressed_size,
            chunk.total_compressed_size,
            chunk.encodings.iter().copied(),
        )?;
        file.end_column()?;
        // fresh dictionary and schedule for the next chunk
        self.values = ValuesWriter::new(
            self.descriptor.physical_type(),
            self.enable_dictionary,
            self.dictionary_page_size,
        );
        self.chunk_value_count = 0;
        self.next_size_check = INITIAL_COUNT_FOR_SIZE_CHECK;
        Ok(())
    }
}
