use super::*;
use crate::compression::CompressionCodec;
use crate::encoding::Encoding;
use crate::metadata::codec::parse_footer;
use crate::schema::{MessageType, PhysicalType, Repetition, SchemaDescriptor, SchemaNode};
use crate::writer::WriterError;

fn flat_schema() -> MessageType {
    MessageType::new(
        "m",
        vec![SchemaNode::primitive(
            "x",
            Repetition::Required,
            PhysicalType::Int32,
        )],
    )
    .unwrap()
}

fn writer() -> FileWriter<Vec<u8>> {
    FileWriter::new(Vec::new(), flat_schema(), Some("test".into()))
}

fn assert_illegal(result: Result<impl std::fmt::Debug, WriterError>, operation: &str) {
    match result {
        Err(WriterError::IllegalState { operation: op, .. }) => assert_eq!(op, operation),
        other => panic!("expected IllegalState for `{operation}`, got {other:?}"),
    }
}

#[test]
fn test_tracked_sink_counts_positions() {
    let mut sink = TrackedSink::new(Vec::new());
    assert_eq!(sink.position(), 0);
    sink.write_all(b"12345").unwrap();
    assert_eq!(sink.position(), 5);
    assert_eq!(sink.get_ref().as_slice(), b"12345");
}

#[test]
fn test_minimal_file_is_framed_and_parseable() {
    let mut w = writer();
    let descriptor = SchemaDescriptor::new(flat_schema());

    w.start().unwrap();
    w.start_block(3).unwrap();
    w.start_column(descriptor.column(0), 3, CompressionCodec::Uncompressed)
        .unwrap();
    let body = [1i32, 2, 3]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect::<Vec<u8>>();
    w.write_data_page(
        3,
        body.len(),
        &body,
        Encoding::BitPacked,
        Encoding::BitPacked,
        Encoding::Plain,
    )
    .unwrap();
    w.end_column().unwrap();
    w.end_block().unwrap();
    let metadata = w.end(Vec::new()).unwrap();

    let bytes = w.into_inner();
    assert_eq!(&bytes[..4], MAGIC.as_slice());
    assert_eq!(&bytes[bytes.len() - 4..], MAGIC.as_slice());

    let footer_len = u32::from_le_bytes(
        bytes[bytes.len() - 8..bytes.len() - 4].try_into().unwrap(),
    ) as usize;
    let footer_end = bytes.len() - 8;
    let footer = parse_footer(&bytes[footer_end - footer_len..footer_end]).unwrap();
    assert_eq!(footer, metadata);
    assert_eq!(footer.num_rows, 3);
    assert_eq!(footer.row_groups.len(), 1);

    let chunk = &footer.row_groups[0].columns[0];
    assert_eq!(chunk.path, ["x"]);
    assert_eq!(chunk.num_values, 3);
    assert_eq!(chunk.first_data_page_offset, 4);
    assert_eq!(chunk.dictionary_page_offset, None);
    assert!(chunk.encodings.contains(&Encoding::Plain));
    // totals cover the payload plus its header
    assert!(chunk.total_uncompressed_size > body.len() as i64);
    assert_eq!(chunk.total_compressed_size, chunk.total_uncompressed_size);
}

#[test]
fn test_empty_file_has_no_row_groups() {
    let mut w = writer();
    w.start().unwrap();
    let metadata = w.end(Vec::new()).unwrap();
    assert_eq!(metadata.num_rows, 0);
    assert!(metadata.row_groups.is_empty());

    let bytes = w.into_inner();
    let footer_len = u32::from_le_bytes(
        bytes[bytes.len() - 8..bytes.len() - 4].try_into().unwrap(),
    ) as usize;
    // magic, footer, length, magic and nothing else
    assert_eq!(bytes.len(), 4 + footer_len + 8);
}

#[test]
fn test_operations_illegal_before_start() {
    let descriptor = SchemaDescriptor::new(flat_schema());

    assert_illegal(writer().start_block(1), "start_block");
    assert_illegal(
        writer().start_column(descriptor.column(0), 1, CompressionCodec::Uncompressed),
        "start_column",
    );
    assert_illegal(writer().end_column(), "end_column");
    assert_illegal(writer().end_block(), "end_block");
    assert_illegal(writer().end(Vec::new()), "end");
    assert_illegal(
        writer().write_data_pages(&[], 0, 0, std::iter::empty()),
        "write_data_pages",
    );
}

#[test]
fn test_operations_illegal_in_started_state() {
    let descriptor = SchemaDescriptor::new(flat_schema());

    let mut w = writer();
    w.start().unwrap();
    assert_illegal(w.start(), "start");

    let mut w = writer();
    w.start().unwrap();
    assert_illegal(
        w.start_column(descriptor.column(0), 1, CompressionCodec::Uncompressed),
        "start_column",
    );

    let mut w = writer();
    w.start().unwrap();
    assert_illegal(w.end_block(), "end_block");

    let mut w = writer();
    w.start().unwrap();
    assert_illegal(w.end_column(), "end_column");
}

#[test]
fn test_operations_illegal_in_block_state() {
    let mut w = writer();
    w.start().unwrap();
    w.start_block(1).unwrap();

    assert_illegal(w.start(), "start");
    assert_illegal(w.start_block(1), "start_block");
    assert_illegal(w.end_column(), "end_column");
    assert_illegal(w.end(Vec::new()), "end");
    assert_illegal(
        w.write_data_page(1, 0, &[], Encoding::BitPacked, Encoding::BitPacked, Encoding::Plain),
        "write_data_page",
    );
}

#[test]
fn test_operations_illegal_in_column_state() {
    let descriptor = SchemaDescriptor::new(flat_schema());
    let mut w = writer();
    w.start().unwrap();
    w.start_block(1).unwrap();
    w.start_column(descriptor.column(0), 1, CompressionCodec::Uncompressed)
        .unwrap();

    assert_illegal(w.start(), "start");
    assert_illegal(w.start_block(1), "start_block");
    assert_illegal(
        w.start_column(descriptor.column(0), 1, CompressionCodec::Uncompressed),
        "start_column",
    );
    assert_illegal(w.end_block(), "end_block");
    assert_illegal(w.end(Vec::new()), "end");
}

#[test]
fn test_operations_illegal_after_end() {
    let mut w = writer();
    w.start().unwrap();
    w.end(Vec::new()).unwrap();

    assert_illegal(w.start(), "start");
    assert_illegal(w.start_block(1), "start_block");
    assert_illegal(w.end(Vec::new()), "end");
}

#[test]
fn test_multiple_blocks_accumulate_rows() {
    let descriptor = SchemaDescriptor::new(flat_schema());
    let mut w = writer();
    w.start().unwrap();
    for rows in [2i64, 5] {
        w.start_block(rows).unwrap();
        w.start_column(descriptor.column(0), rows, CompressionCodec::Uncompressed)
            .unwrap();
        let body = vec![0u8; 4 * rows as usize];
        w.write_data_page(
            rows as i32,
            body.len(),
            &body,
            Encoding::BitPacked,
            Encoding::BitPacked,
            Encoding::Plain,
        )
        .unwrap();
        w.end_column().unwrap();
        w.end_block().unwrap();
    }
    let metadata = w.end(Vec::new()).unwrap();
    assert_eq!(metadata.num_rows, 7);
    assert_eq!(metadata.row_groups.len(), 2);
    assert_eq!(metadata.row_groups[1].num_rows, 5);
}
