use std::sync::Arc;

use super::*;
use crate::compression::{CompressionCodec, Uncompressed};
use crate::encoding::{decode_rle_hybrid, Encoding};
use crate::file::FileWriter;
use crate::metadata::codec::parse_page_header;
use crate::metadata::{FileMetaData, PageHeader, PageType};
use crate::record::{RecordError, ShredConsumer, Value};
use crate::schema::{MessageType, PhysicalType, Repetition, SchemaDescriptor, SchemaNode};
use crate::writer::{WriterConfig, WriterError};

fn flat_int32() -> SchemaDescriptor {
    SchemaDescriptor::new(
        MessageType::new(
            "m",
            vec![SchemaNode::primitive(
                "x",
                Repetition::Required,
                PhysicalType::Int32,
            )],
        )
        .unwrap(),
    )
}

fn optional_int32() -> SchemaDescriptor {
    SchemaDescriptor::new(
        MessageType::new(
            "m",
            vec![SchemaNode::primitive(
                "x",
                Repetition::Optional,
                PhysicalType::Int32,
            )],
        )
        .unwrap(),
    )
}

fn column_writer(descriptor: &SchemaDescriptor, config: &WriterConfig) -> ColumnWriter {
    ColumnWriter::new(
        descriptor.column(0).clone(),
        config,
        Arc::new(Uncompressed),
        1024,
    )
}

/// Flush `column` as the only chunk of the only row group and return the
/// raw row-group bytes plus the parsed footer
fn flush_to_file(
    mut column: ColumnWriter,
    rows: i64,
    schema: &SchemaDescriptor,
) -> (Vec<u8>, FileMetaData) {
    let mut file = FileWriter::new(Vec::new(), schema.root().clone(), None);
    file.start().unwrap();
    file.start_block(rows).unwrap();
    column.flush_chunk(&mut file).unwrap();
    file.end_block().unwrap();
    let metadata = file.end(Vec::new()).unwrap();
    let bytes = file.into_inner();
    let footer_len = u32::from_le_bytes(
        bytes[bytes.len() - 8..bytes.len() - 4].try_into().unwrap(),
    ) as usize;
    let chunk_bytes = bytes[4..bytes.len() - 8 - footer_len].to_vec();
    (chunk_bytes, metadata)
}

/// Split a chunk buffer into its framed pages
fn read_pages(mut bytes: &[u8]) -> Vec<(PageHeader, Vec<u8>)> {
    let mut pages = Vec::new();
    while !bytes.is_empty() {
        let (header, header_len) = parse_page_header(bytes).unwrap();
        let end = header_len + header.compressed_page_size as usize;
        pages.push((header.clone(), bytes[header_len..end].to_vec()));
        bytes = &bytes[end..];
    }
    pages
}

#[test]
fn test_plain_chunk_for_required_column() {
    let schema = flat_int32();
    let config = WriterConfig::default().without_dictionary();
    let mut column = column_writer(&schema, &config);
    for v in [1, 2, 3] {
        column.write_value(&Value::Int32(v), 0, 0).unwrap();
    }

    let (chunk, metadata) = flush_to_file(column, 3, &schema);
    let pages = read_pages(&chunk);
    assert_eq!(pages.len(), 1);

    let (header, payload) = &pages[0];
    assert_eq!(header.page_type, PageType::DataPage);
    let data = header.data_page_header.as_ref().unwrap();
    assert_eq!(data.num_values, 3);
    assert_eq!(data.encoding, Encoding::Plain);
    assert_eq!(data.repetition_level_encoding, Encoding::BitPacked);
    assert_eq!(data.definition_level_encoding, Encoding::BitPacked);
    // no level streams at max level zero: payload is the values alone
    assert_eq!(payload.as_slice(), [1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);

    let chunk_meta = &metadata.row_groups[0].columns[0];
    assert_eq!(chunk_meta.num_values, 3);
    assert_eq!(chunk_meta.encodings, vec![Encoding::Plain, Encoding::BitPacked]);
}

#[test]
fn test_optional_column_page_layout() {
    let schema = optional_int32();
    let config = WriterConfig::default().without_dictionary();
    let mut column = column_writer(&schema, &config);
    column.write_value(&Value::Int32(7), 0, 1).unwrap();
    column.write_null(0, 0).unwrap();
    column.write_value(&Value::Int32(9), 0, 1).unwrap();

    let (chunk, _) = flush_to_file(column, 3, &schema);
    let pages = read_pages(&chunk);
    let (header, payload) = &pages[0];

    let data = header.data_page_header.as_ref().unwrap();
    assert_eq!(data.num_values, 3);
    assert_eq!(data.definition_level_encoding, Encoding::Rle);
    assert_eq!(data.repetition_level_encoding, Encoding::BitPacked);

    // definition stream leads with its length prefix, values follow
    let def_len = u32::from_le_bytes(payload[..4].try_into().unwrap()) as usize;
    let def_levels = decode_rle_hybrid(&payload[4..4 + def_len], 1, 3).unwrap();
    assert_eq!(def_levels, [1, 0, 1]);
    let values = &payload[4 + def_len..];
    assert_eq!(values, [7, 0, 0, 0, 9, 0, 0, 0]);
}

#[test]
fn test_dictionary_chunk_layout_and_offsets() {
    let schema = flat_int32();
    let config = WriterConfig::default();
    let mut column = column_writer(&schema, &config);
    for v in [5, 6, 5, 6, 5, 5] {
        column.write_value(&Value::Int32(v), 0, 0).unwrap();
    }

    let (chunk, metadata) = flush_to_file(column, 6, &schema);
    let pages = read_pages(&chunk);
    assert_eq!(pages.len(), 2);

    let (dict_header, dict_payload) = &pages[0];
    assert_eq!(dict_header.page_type, PageType::DictionaryPage);
    let dict = dict_header.dictionary_page_header.as_ref().unwrap();
    assert_eq!(dict.num_values, 2);
    assert_eq!(dict.encoding, Encoding::PlainDictionary);
    assert!(!dict.is_sorted);
    assert_eq!(dict_payload.as_slice(), [5, 0, 0, 0, 6, 0, 0, 0]);

    let (data_header, data_payload) = &pages[1];
    assert_eq!(data_header.page_type, PageType::DataPage);
    let data = data_header.data_page_header.as_ref().unwrap();
    assert_eq!(data.encoding, Encoding::PlainDictionary);
    assert_eq!(data_payload[0], 1); // id bit width
    assert_eq!(
        decode_rle_hybrid(&data_payload[1..], 1, 6).unwrap(),
        [0, 1, 0, 1, 0, 0]
    );

    let chunk_meta = &metadata.row_groups[0].columns[0];
    assert_eq!(chunk_meta.dictionary_page_offset, Some(4));
    assert_eq!(chunk_meta.first_data_page_offset, 4);
    assert!(chunk_meta.encodings.contains(&Encoding::PlainDictionary));
}

#[test]
fn test_page_size_bound_cuts_pages() {
    let schema = flat_int32();
    let config = WriterConfig::default()
        .without_dictionary()
        .with_page_size(64);
    let mut column = column_writer(&schema, &config);
    for v in 0..300 {
        column.write_value(&Value::Int32(v), 0, 0).unwrap();
    }

    let (chunk, metadata) = flush_to_file(column, 300, &schema);
    let pages = read_pages(&chunk);
    assert!(pages.len() >= 2, "expected several pages, got {}", pages.len());

    let total: i32 = pages
        .iter()
        .map(|(header, _)| header.data_page_header.as_ref().unwrap().num_values)
        .sum();
    assert_eq!(total, 300);
    assert_eq!(metadata.row_groups[0].columns[0].num_values, 300);
}

#[test]
fn test_boolean_column_stays_plain_despite_dictionary() {
    let schema = SchemaDescriptor::new(
        MessageType::new(
            "m",
            vec![SchemaNode::primitive(
                "flag",
                Repetition::Required,
                PhysicalType::Boolean,
            )],
        )
        .unwrap(),
    );
    let config = WriterConfig::default();
    let mut column = column_writer(&schema, &config);
    for i in 0..9 {
        column.write_value(&Value::Bool(i % 2 == 0), 0, 0).unwrap();
    }

    let (chunk, metadata) = flush_to_file(column, 9, &schema);
    let pages = read_pages(&chunk);
    assert_eq!(pages.len(), 1);
    let (header, payload) = &pages[0];
    assert_eq!(
        header.data_page_header.as_ref().unwrap().encoding,
        Encoding::Plain
    );
    // nine booleans pack into two bytes, LSB first
    assert_eq!(payload.as_slice(), [0b0101_0101, 0b0000_0001]);
    assert_eq!(metadata.row_groups[0].columns[0].dictionary_page_offset, None);
}

#[test]
fn test_type_mismatch_is_invalid_record() {
    let schema = flat_int32();
    let config = WriterConfig::default();
    let mut column = column_writer(&schema, &config);

    let result = column.write_value(&Value::Int64(1), 0, 0);
    assert!(matches!(
        result,
        Err(WriterError::Record(RecordError::TypeMismatch { expected, .. }))
            if expected == PhysicalType::Int32
    ));
}

#[test]
fn test_fixed_len_mismatch_is_invalid_record() {
    let schema = SchemaDescriptor::new(
        MessageType::new(
            "m",
            vec![SchemaNode::fixed_len("f", Repetition::Required, 4)],
        )
        .unwrap(),
    );
    let config = WriterConfig::default();
    let mut column = column_writer(&schema, &config);

    column
        .write_value(&Value::bytes([1u8, 2, 3, 4].as_slice()), 0, 0)
        .unwrap();
    let result = column.write_value(&Value::bytes([1u8, 2].as_slice()), 0, 0);
    assert!(matches!(
        result,
        Err(WriterError::Record(RecordError::FixedLenMismatch {
            expected: 4,
            actual: 2,
            ..
        }))
    ));
}

#[test]
fn test_validating_rejects_bad_levels() {
    let schema = optional_int32();
    let config = WriterConfig::default().with_validation();
    let mut column = column_writer(&schema, &config);

    // present value must sit at the maximum definition level
    assert!(matches!(
        column.write_value(&Value::Int32(1), 0, 0),
        Err(WriterError::Record(RecordError::LevelOutOfRange { kind: "definition", .. }))
    ));
    // nulls must sit below it
    assert!(matches!(
        column.write_null(0, 1),
        Err(WriterError::Record(RecordError::LevelOutOfRange { kind: "definition", .. }))
    ));
    // repetition is bounded by the column's maximum
    assert!(matches!(
        column.write_value(&Value::Int32(1), 3, 1),
        Err(WriterError::Record(RecordError::LevelOutOfRange { kind: "repetition", .. }))
    ));
}

#[test]
fn test_store_fans_out_in_leaf_order() {
    let schema = SchemaDescriptor::new(
        MessageType::new(
            "m",
            vec![
                SchemaNode::primitive("a", Repetition::Required, PhysicalType::Int64),
                SchemaNode::primitive("b", Repetition::Optional, PhysicalType::ByteArray),
            ],
        )
        .unwrap(),
    );
    let config = WriterConfig::default().without_dictionary();
    let mut store = ColumnStore::new(&schema, &config, Arc::new(Uncompressed));

    for row in 0..5i64 {
        store.start_record();
        store.write_value(0, &Value::Int64(row), 0, 0).unwrap();
        if row % 2 == 0 {
            store.write_value(1, &Value::bytes("even"), 0, 1).unwrap();
        } else {
            store.write_null(1, 0, 0).unwrap();
        }
        store.end_record();
    }
    assert_eq!(store.row_count(), 5);
    assert!(store.mem_size() > 0);

    let mut file = FileWriter::new(Vec::new(), schema.root().clone(), None);
    file.start().unwrap();
    store.flush(&mut file).unwrap();
    assert_eq!(store.row_count(), 0);
    let metadata = file.end(Vec::new()).unwrap();

    let row_group = &metadata.row_groups[0];
    assert_eq!(row_group.num_rows, 5);
    assert_eq!(row_group.columns.len(), 2);
    assert_eq!(row_group.columns[0].path, ["a"]);
    assert_eq!(row_group.columns[1].path, ["b"]);
    assert_eq!(row_group.columns[0].num_values, 5);
    assert_eq!(row_group.columns[1].num_values, 5);
    assert!(row_group.total_byte_size > 0);
}

#[test]
fn test_compressed_chunk_records_both_sizes() {
    let schema = flat_int32();
    let config = WriterConfig::gzip().without_dictionary();
    let mut column = ColumnWriter::new(
        schema.column(0).clone(),
        &config,
        Arc::new(crate::compression::Gzip::default()),
        1024,
    );
    for _ in 0..1000 {
        column.write_value(&Value::Int32(42), 0, 0).unwrap();
    }

    let (_, metadata) = flush_to_file(column, 1000, &schema);
    let chunk_meta = &metadata.row_groups[0].columns[0];
    assert_eq!(chunk_meta.codec, CompressionCodec::Gzip);
    assert!(chunk_meta.total_compressed_size < chunk_meta.total_uncompressed_size);
}
