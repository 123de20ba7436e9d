//! End-to-end shredding round trip: write nested records, then walk the
//! file's pages with the public decode surface and check every
//! (value, repetition, definition) triple, null positions included.

use parquetry::encoding::bytes_util::bits_needed;
use parquetry::encoding::{decode_rle_hybrid, Encoding};
use parquetry::metadata::codec::{parse_footer, parse_page_header};
use parquetry::metadata::{FileMetaData, PageType};
use parquetry::prelude::*;

type Triple = (Option<i32>, u16, u16);

fn parse_trailing_footer(bytes: &[u8]) -> FileMetaData {
    let footer_len = u32::from_le_bytes(
        bytes[bytes.len() - 8..bytes.len() - 4].try_into().unwrap(),
    ) as usize;
    let footer_end = bytes.len() - 8;
    parse_footer(&bytes[footer_end - footer_len..footer_end]).unwrap()
}

/// Decode every triple of the file's single int32 leaf column
fn read_int32_triples(bytes: &[u8], max_rep: u16, max_def: u16) -> Vec<Triple> {
    let footer = parse_trailing_footer(bytes);
    let mut triples = Vec::new();
    for row_group in &footer.row_groups {
        let chunk = &row_group.columns[0];
        let mut pos = chunk
            .dictionary_page_offset
            .unwrap_or(chunk.first_data_page_offset) as usize;
        let mut dictionary: Vec<i32> = Vec::new();
        let mut values_read: i64 = 0;
        while values_read < chunk.num_values {
            let (header, header_len) = parse_page_header(&bytes[pos..]).unwrap();
            let payload_start = pos + header_len;
            let payload =
                &bytes[payload_start..payload_start + header.compressed_page_size as usize];
            pos = payload_start + header.compressed_page_size as usize;
            match header.page_type {
                PageType::DictionaryPage => {
                    dictionary = payload
                        .chunks_exact(4)
                        .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
                        .collect();
                }
                PageType::DataPage => {
                    let data = header.data_page_header.as_ref().unwrap();
                    let count = data.num_values as usize;
                    let mut rest = payload;
                    let rep_levels = read_level_stream(&mut rest, max_rep, count);
                    let def_levels = read_level_stream(&mut rest, max_def, count);
                    let present = def_levels.iter().filter(|&&d| d == max_def).count();
                    let values = match data.encoding {
                        Encoding::Plain => rest
                            .chunks_exact(4)
                            .take(present)
                            .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
                            .collect::<Vec<_>>(),
                        Encoding::PlainDictionary => {
                            let width = u32::from(rest[0]);
                            decode_rle_hybrid(&rest[1..], width, present)
                                .unwrap()
                                .into_iter()
                                .map(|id| dictionary[id as usize])
                                .collect()
                        }
                        other => panic!("unexpected values encoding {other:?}"),
                    };
                    let mut next_value = values.into_iter();
                    for i in 0..count {
                        let value = (def_levels[i] == max_def).then(|| next_value.next().unwrap());
                        triples.push((value, rep_levels[i], def_levels[i]));
                    }
                    values_read += count as i64;
                }
                PageType::IndexPage => panic!("writer never emits index pages"),
            }
        }
    }
    triples
}

/// Pop one length-prefixed level stream off the front of `payload`
fn read_level_stream(payload: &mut &[u8], max_level: u16, count: usize) -> Vec<u16> {
    if max_level == 0 {
        return vec![0; count];
    }
    let len = u32::from_le_bytes(payload[..4].try_into().unwrap()) as usize;
    let levels = decode_rle_hybrid(&payload[4..4 + len], bits_needed(u32::from(max_level)), count)
        .unwrap()
        .into_iter()
        .map(|l| l as u16)
        .collect();
    *payload = &payload[4 + len..];
    levels
}

fn nested_schema() -> MessageType {
    // message M { optional group a { repeated group b { required int32 c; } } }
    MessageType::new(
        "M",
        vec![SchemaNode::group(
            "a",
            Repetition::Optional,
            vec![SchemaNode::group(
                "b",
                Repetition::Repeated,
                vec![SchemaNode::primitive(
                    "c",
                    Repetition::Required,
                    PhysicalType::Int32,
                )],
            )],
        )],
    )
    .unwrap()
}

fn b_of(c: i32) -> Value {
    Record::new().with("c", c).into()
}

#[test]
fn test_nested_records_round_trip() {
    let mut writer = ParquetWriter::new(
        Vec::new(),
        nested_schema(),
        WriterConfig::default().without_dictionary(),
    )
    .unwrap();

    // {a: {b: [{c: 1}, {c: 2}]}}, {a: {b: []}}, {a: null}, {}
    writer
        .write(&Record::new().with(
            "a",
            Record::new().with("b", Value::list([b_of(1), b_of(2)])),
        ))
        .unwrap();
    writer
        .write(&Record::new().with("a", Record::new().with("b", Value::list([]))))
        .unwrap();
    writer.write(&Record::new().with("a", Value::Null)).unwrap();
    writer.write(&Record::new()).unwrap();
    writer.finish().unwrap();

    let bytes = writer.into_inner();
    let triples = read_int32_triples(&bytes, 1, 2);
    assert_eq!(
        triples,
        [
            (Some(1), 0, 2),
            (Some(2), 1, 2),
            (None, 0, 1),
            (None, 0, 0),
            (None, 0, 0),
        ]
    );

    let footer = parse_trailing_footer(&bytes);
    assert_eq!(footer.num_rows, 4);
    assert_eq!(footer.row_groups[0].columns[0].num_values, 5);
    assert_eq!(footer.row_groups[0].columns[0].path, ["a", "b", "c"]);
}

#[test]
fn test_dictionary_encoded_column_round_trips() {
    let schema = MessageType::new(
        "m",
        vec![SchemaNode::primitive(
            "code",
            Repetition::Optional,
            PhysicalType::Int32,
        )],
    )
    .unwrap();
    let mut writer =
        ParquetWriter::new(Vec::new(), schema, WriterConfig::default()).unwrap();

    let codes = [Some(500), Some(7), None, Some(500), Some(500), None, Some(7)];
    for code in codes {
        let record = match code {
            Some(code) => Record::new().with("code", code),
            None => Record::new(),
        };
        writer.write(&record).unwrap();
    }
    writer.finish().unwrap();

    let bytes = writer.into_inner();
    let triples = read_int32_triples(&bytes, 0, 1);
    let expected: Vec<Triple> = codes
        .iter()
        .map(|code| match code {
            Some(code) => (Some(*code), 0, 1),
            None => (None, 0, 0),
        })
        .collect();
    assert_eq!(triples, expected);

    let footer = parse_trailing_footer(&bytes);
    let chunk = &footer.row_groups[0].columns[0];
    assert!(chunk.dictionary_page_offset.is_some());
    assert!(chunk.encodings.contains(&Encoding::PlainDictionary));
}

#[test]
fn test_round_trip_across_row_groups() {
    let schema = MessageType::new(
        "m",
        vec![SchemaNode::primitive(
            "x",
            Repetition::Optional,
            PhysicalType::Int32,
        )],
    )
    .unwrap();
    let config = WriterConfig::default()
        .without_dictionary()
        .with_block_size(256);
    let mut writer = ParquetWriter::new(Vec::new(), schema, config).unwrap();

    let mut expected = Vec::new();
    for i in 0..1000 {
        if i % 5 == 0 {
            writer.write(&Record::new()).unwrap();
            expected.push((None, 0, 0));
        } else {
            writer.write(&Record::new().with("x", i)).unwrap();
            expected.push((Some(i), 0, 1));
        }
    }
    let stats = writer.finish().unwrap();
    assert!(stats.row_groups_written >= 2);

    let bytes = writer.into_inner();
    assert_eq!(read_int32_triples(&bytes, 0, 1), expected);
}
