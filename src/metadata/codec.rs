//! Footer and page-header wire codec.
//!
//! Structures go out over the Thrift compact protocol with the
//! interoperable field ids, so any reader of the format can parse this
//! crate's files. The schema tree is flattened depth-first into a list of
//! elements carrying `num_children`; the parse side rebuilds and
//! re-validates the tree. Serialization is canonical: for any footer,
//! `serialize_footer(parse_footer(bytes)) == bytes`.

use super::thrift::{wire, CompactReader, CompactWriter};
use super::{
    ColumnChunkMetaData, DataPageHeader, DictionaryPageHeader, FileMetaData, KeyValue,
    MetadataError, PageHeader, PageType, RowGroupMetaData,
};
use crate::compression::CompressionCodec;
use crate::encoding::Encoding;
use crate::schema::{MessageType, PhysicalType, Repetition, SchemaNode};

// ============================================================================
// Serialization
// ============================================================================

/// Serialize a footer to its wire bytes
pub fn serialize_footer(meta: &FileMetaData) -> Vec<u8> {
    let mut w = CompactWriter::new();
    w.struct_begin();
    w.field_i32(1, meta.version);
    write_schema(&mut w, &meta.schema);
    w.field_i64(3, meta.num_rows);
    w.field_list_begin(4, wire::STRUCT, meta.row_groups.len());
    for row_group in &meta.row_groups {
        write_row_group(&mut w, row_group);
    }
    if !meta.key_value_metadata.is_empty() {
        w.field_list_begin(5, wire::STRUCT, meta.key_value_metadata.len());
        for kv in &meta.key_value_metadata {
            write_key_value(&mut w, kv);
        }
    }
    if let Some(created_by) = &meta.created_by {
        w.field_string(6, created_by);
    }
    w.struct_end();
    w.into_bytes()
}

/// Serialize one page header to its wire bytes
pub fn serialize_page_header(header: &PageHeader) -> Vec<u8> {
    let mut w = CompactWriter::new();
    w.struct_begin();
    w.field_i32(1, header.page_type.code());
    w.field_i32(2, header.uncompressed_page_size);
    w.field_i32(3, header.compressed_page_size);
    if let Some(crc) = header.crc {
        w.field_i32(4, crc);
    }
    if let Some(data) = &header.data_page_header {
        w.field_struct_begin(5);
        w.field_i32(1, data.num_values);
        w.field_i32(2, data.encoding.code());
        w.field_i32(3, data.definition_level_encoding.code());
        w.field_i32(4, data.repetition_level_encoding.code());
        w.struct_end();
    }
    if let Some(dict) = &header.dictionary_page_header {
        w.field_struct_begin(7);
        w.field_i32(1, dict.num_values);
        w.field_i32(2, dict.encoding.code());
        w.field_bool(3, dict.is_sorted);
        w.struct_end();
    }
    w.struct_end();
    w.into_bytes()
}

fn write_schema(w: &mut CompactWriter, schema: &MessageType) {
    let mut count = 1;
    for field in schema.fields() {
        count += node_count(field);
    }
    w.field_list_begin(2, wire::STRUCT, count);
    // root element: name and child count only
    w.struct_begin();
    w.field_string(4, schema.name());
    w.field_i32(5, schema.fields().len() as i32);
    w.struct_end();
    for field in schema.fields() {
        write_schema_node(w, field);
    }
}

fn node_count(node: &SchemaNode) -> usize {
    match node {
        SchemaNode::Primitive { .. } => 1,
        SchemaNode::Group { children, .. } => {
            1 + children.iter().map(node_count).sum::<usize>()
        }
    }
}

fn write_schema_node(w: &mut CompactWriter, node: &SchemaNode) {
    w.struct_begin();
    match node {
        SchemaNode::Primitive {
            name,
            repetition,
            physical_type,
            type_length,
        } => {
            w.field_i32(1, physical_type.code());
            if *physical_type == PhysicalType::FixedLenByteArray {
                w.field_i32(2, *type_length as i32);
            }
            w.field_i32(3, repetition.code());
            w.field_string(4, name);
            w.struct_end();
        }
        SchemaNode::Group {
            name,
            repetition,
            children,
        } => {
            w.field_i32(3, repetition.code());
            w.field_string(4, name);
            w.field_i32(5, children.len() as i32);
            w.struct_end();
            for child in children {
                write_schema_node(w, child);
            }
        }
    }
}

fn write_row_group(w: &mut CompactWriter, row_group: &RowGroupMetaData) {
    w.struct_begin();
    w.field_list_begin(1, wire::STRUCT, row_group.columns.len());
    for column in &row_group.columns {
        write_column_chunk(w, column);
    }
    w.field_i64(2, row_group.total_byte_size);
    w.field_i64(3, row_group.num_rows);
    w.struct_end();
}

fn write_column_chunk(w: &mut CompactWriter, column: &ColumnChunkMetaData) {
    w.struct_begin();
    w.field_i64(2, column.first_data_page_offset);
    w.field_struct_begin(3);
    w.field_i32(1, column.physical_type.code());
    w.field_list_begin(2, wire::I32, column.encodings.len());
    for encoding in &column.encodings {
        w.elem_i32(encoding.code());
    }
    w.field_list_begin(3, wire::BINARY, column.path.len());
    for part in &column.path {
        w.elem_binary(part.as_bytes());
    }
    w.field_i32(4, column.codec.code());
    w.field_i64(5, column.num_values);
    w.field_i64(6, column.total_uncompressed_size);
    w.field_i64(7, column.total_compressed_size);
    w.field_i64(9, column.first_data_page_offset);
    if let Some(offset) = column.dictionary_page_offset {
        w.field_i64(11, offset);
    }
    w.struct_end();
    w.struct_end();
}

fn write_key_value(w: &mut CompactWriter, kv: &KeyValue) {
    w.struct_begin();
    w.field_string(1, &kv.key);
    if let Some(value) = &kv.value {
        w.field_string(2, value);
    }
    w.struct_end();
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a footer from its wire bytes
pub fn parse_footer(bytes: &[u8]) -> Result<FileMetaData, MetadataError> {
    let mut r = CompactReader::new(bytes);
    r.struct_begin();
    let mut version = None;
    let mut schema = None;
    let mut num_rows = None;
    let mut row_groups = Vec::new();
    let mut key_value_metadata = Vec::new();
    let mut created_by = None;
    while let Some(field) = r.field_header()? {
        match field.id {
            1 => version = Some(r.read_i32()?),
            2 => schema = Some(read_schema(&mut r)?),
            3 => num_rows = Some(r.read_i64()?),
            4 => {
                let (_, len) = r.list_header()?;
                for _ in 0..len {
                    row_groups.push(read_row_group(&mut r)?);
                }
            }
            5 => {
                let (_, len) = r.list_header()?;
                for _ in 0..len {
                    key_value_metadata.push(read_key_value(&mut r)?);
                }
            }
            6 => created_by = Some(r.read_string()?),
            _ => r.skip(field.wire_type)?,
        }
    }
    Ok(FileMetaData {
        version: version.ok_or(MetadataError::MissingField("version"))?,
        schema: schema.ok_or(MetadataError::MissingField("schema"))?,
        num_rows: num_rows.ok_or(MetadataError::MissingField("num_rows"))?,
        row_groups,
        key_value_metadata,
        created_by,
    })
}

/// Parse one page header from the front of `bytes`
///
/// Returns the header and how many bytes it occupied.
pub fn parse_page_header(bytes: &[u8]) -> Result<(PageHeader, usize), MetadataError> {
    let mut r = CompactReader::new(bytes);
    r.struct_begin();
    let mut page_type = None;
    let mut uncompressed_page_size = None;
    let mut compressed_page_size = None;
    let mut crc = None;
    let mut data_page_header = None;
    let mut dictionary_page_header = None;
    while let Some(field) = r.field_header()? {
        match field.id {
            1 => {
                let code = r.read_i32()?;
                page_type = Some(
                    PageType::from_code(code)
                        .ok_or(MetadataError::UnknownEnum { kind: "page type", code })?,
                );
            }
            2 => uncompressed_page_size = Some(r.read_i32()?),
            3 => compressed_page_size = Some(r.read_i32()?),
            4 => crc = Some(r.read_i32()?),
            5 => data_page_header = Some(read_data_page_header(&mut r)?),
            7 => dictionary_page_header = Some(read_dictionary_page_header(&mut r)?),
            _ => r.skip(field.wire_type)?,
        }
    }
    let header = PageHeader {
        page_type: page_type.ok_or(MetadataError::MissingField("page type"))?,
        uncompressed_page_size: uncompressed_page_size
            .ok_or(MetadataError::MissingField("uncompressed_page_size"))?,
        compressed_page_size: compressed_page_size
            .ok_or(MetadataError::MissingField("compressed_page_size"))?,
        crc,
        data_page_header,
        dictionary_page_header,
    };
    Ok((header, r.position()))
}

fn read_data_page_header(r: &mut CompactReader<'_>) -> Result<DataPageHeader, MetadataError> {
    r.struct_begin();
    let mut num_values = None;
    let mut encoding = None;
    let mut definition_level_encoding = None;
    let mut repetition_level_encoding = None;
    while let Some(field) = r.field_header()? {
        match field.id {
            1 => num_values = Some(r.read_i32()?),
            2 => encoding = Some(read_encoding(r)?),
            3 => definition_level_encoding = Some(read_encoding(r)?),
            4 => repetition_level_encoding = Some(read_encoding(r)?),
            _ => r.skip(field.wire_type)?,
        }
    }
    Ok(DataPageHeader {
        num_values: num_values.ok_or(MetadataError::MissingField("num_values"))?,
        encoding: encoding.ok_or(MetadataError::MissingField("encoding"))?,
        definition_level_encoding: definition_level_encoding
            .ok_or(MetadataError::MissingField("definition_level_encoding"))?,
        repetition_level_encoding: repetition_level_encoding
            .ok_or(MetadataError::MissingField("repetition_level_encoding"))?,
    })
}

fn read_dictionary_page_header(
    r: &mut CompactReader<'_>,
) -> Result<DictionaryPageHeader, MetadataError> {
    r.struct_begin();
    let mut num_values = None;
    let mut encoding = None;
    let mut is_sorted = false;
    while let Some(field) = r.field_header()? {
        match field.id {
            1 => num_values = Some(r.read_i32()?),
            2 => encoding = Some(read_encoding(r)?),
            3 => is_sorted = field.bool_value,
            _ => r.skip(field.wire_type)?,
        }
    }
    Ok(DictionaryPageHeader {
        num_values: num_values.ok_or(MetadataError::MissingField("num_values"))?,
        encoding: encoding.ok_or(MetadataError::MissingField("encoding"))?,
        is_sorted,
    })
}

fn read_encoding(r: &mut CompactReader<'_>) -> Result<Encoding, MetadataError> {
    let code = r.read_i32()?;
    Encoding::from_code(code).ok_or(MetadataError::UnknownEnum { kind: "encoding", code })
}

/// One flattened schema element, before tree reconstruction
struct SchemaElement {
    type_code: Option<i32>,
    type_length: Option<i32>,
    repetition: Option<i32>,
    name: String,
    num_children: Option<i32>,
}

fn read_schema(r: &mut CompactReader<'_>) -> Result<MessageType, MetadataError> {
    let (_, len) = r.list_header()?;
    if len == 0 {
        return Err(MetadataError::MissingField("schema root"));
    }
    let mut elements = Vec::with_capacity(len);
    for _ in 0..len {
        elements.push(read_schema_element(r)?);
    }
    let root = &elements[0];
    let num_children = root
        .num_children
        .ok_or(MetadataError::MissingField("root num_children"))?;
    let mut next = 1;
    let mut fields = Vec::with_capacity(num_children as usize);
    for _ in 0..num_children {
        fields.push(rebuild_node(&elements, &mut next)?);
    }
    Ok(MessageType::new(root.name.clone(), fields)?)
}

fn rebuild_node(elements: &[SchemaElement], next: &mut usize) -> Result<SchemaNode, MetadataError> {
    let element = elements
        .get(*next)
        .ok_or(MetadataError::MissingField("schema element"))?;
    *next += 1;
    let repetition_code = element
        .repetition
        .ok_or(MetadataError::MissingField("repetition_type"))?;
    let repetition = Repetition::from_code(repetition_code).ok_or(MetadataError::UnknownEnum {
        kind: "repetition",
        code: repetition_code,
    })?;
    match element.num_children {
        Some(count) if count > 0 => {
            let mut children = Vec::with_capacity(count as usize);
            for _ in 0..count {
                children.push(rebuild_node(elements, next)?);
            }
            Ok(SchemaNode::Group {
                name: element.name.clone(),
                repetition,
                children,
            })
        }
        _ => {
            let type_code = element
                .type_code
                .ok_or(MetadataError::MissingField("type"))?;
            let physical_type = PhysicalType::from_code(type_code).ok_or(
                MetadataError::UnknownEnum { kind: "physical type", code: type_code },
            )?;
            Ok(SchemaNode::Primitive {
                name: element.name.clone(),
                repetition,
                physical_type,
                type_length: element.type_length.unwrap_or(0) as usize,
            })
        }
    }
}

fn read_schema_element(r: &mut CompactReader<'_>) -> Result<SchemaElement, MetadataError> {
    r.struct_begin();
    let mut element = SchemaElement {
        type_code: None,
        type_length: None,
        repetition: None,
        name: String::new(),
        num_children: None,
    };
    while let Some(field) = r.field_header()? {
        match field.id {
            1 => element.type_code = Some(r.read_i32()?),
            2 => element.type_length = Some(r.read_i32()?),
            3 => element.repetition = Some(r.read_i32()?),
            4 => element.name = r.read_string()?,
            5 => element.num_children = Some(r.read_i32()?),
            _ => r.skip(field.wire_type)?,
        }
    }
    Ok(element)
}

fn read_row_group(r: &mut CompactReader<'_>) -> Result<RowGroupMetaData, MetadataError> {
    r.struct_begin();
    let mut columns = Vec::new();
    let mut total_byte_size = None;
    let mut num_rows = None;
    while let Some(field) = r.field_header()? {
        match field.id {
            1 => {
                let (_, len) = r.list_header()?;
                for _ in 0..len {
                    columns.push(read_column_chunk(r)?);
                }
            }
            2 => total_byte_size = Some(r.read_i64()?),
            3 => num_rows = Some(r.read_i64()?),
            _ => r.skip(field.wire_type)?,
        }
    }
    Ok(RowGroupMetaData {
        columns,
        total_byte_size: total_byte_size.ok_or(MetadataError::MissingField("total_byte_size"))?,
        num_rows: num_rows.ok_or(MetadataError::MissingField("num_rows"))?,
    })
}

fn read_column_chunk(r: &mut CompactReader<'_>) -> Result<ColumnChunkMetaData, MetadataError> {
    r.struct_begin();
    let mut meta = None;
    while let Some(field) = r.field_header()? {
        match field.id {
            3 => meta = Some(read_column_meta(r)?),
            _ => r.skip(field.wire_type)?,
        }
    }
    meta.ok_or(MetadataError::MissingField("column meta_data"))
}

fn read_column_meta(r: &mut CompactReader<'_>) -> Result<ColumnChunkMetaData, MetadataError> {
    r.struct_begin();
    let mut type_code = None;
    let mut encodings = Vec::new();
    let mut path = Vec::new();
    let mut codec_code = None;
    let mut num_values = None;
    let mut total_uncompressed_size = None;
    let mut total_compressed_size = None;
    let mut first_data_page_offset = None;
    let mut dictionary_page_offset = None;
    while let Some(field) = r.field_header()? {
        match field.id {
            1 => type_code = Some(r.read_i32()?),
            2 => {
                let (_, len) = r.list_header()?;
                for _ in 0..len {
                    encodings.push(read_encoding(r)?);
                }
            }
            3 => {
                let (_, len) = r.list_header()?;
                for _ in 0..len {
                    path.push(r.read_string()?);
                }
            }
            4 => codec_code = Some(r.read_i32()?),
            5 => num_values = Some(r.read_i64()?),
            6 => total_uncompressed_size = Some(r.read_i64()?),
            7 => total_compressed_size = Some(r.read_i64()?),
            9 => first_data_page_offset = Some(r.read_i64()?),
            11 => dictionary_page_offset = Some(r.read_i64()?),
            _ => r.skip(field.wire_type)?,
        }
    }
    let type_code = type_code.ok_or(MetadataError::MissingField("type"))?;
    let codec_code = codec_code.ok_or(MetadataError::MissingField("codec"))?;
    Ok(ColumnChunkMetaData {
        path,
        physical_type: PhysicalType::from_code(type_code).ok_or(MetadataError::UnknownEnum {
            kind: "physical type",
            code: type_code,
        })?,
        codec: CompressionCodec::from_code(codec_code).ok_or(MetadataError::UnknownEnum {
            kind: "compression codec",
            code: codec_code,
        })?,
        encodings,
        first_data_page_offset: first_data_page_offset
            .ok_or(MetadataError::MissingField("data_page_offset"))?,
        dictionary_page_offset,
        num_values: num_values.ok_or(MetadataError::MissingField("num_values"))?,
        total_compressed_size: total_compressed_size
            .ok_or(MetadataError::MissingField("total_compressed_size"))?,
        total_uncompressed_size: total_uncompressed_size
            .ok_or(MetadataError::MissingField("total_uncompressed_size"))?,
    })
}

fn read_key_value(r: &mut CompactReader<'_>) -> Result<KeyValue, MetadataError> {
    r.struct_begin();
    let mut key = None;
    let mut value = None;
    while let Some(field) = r.field_header()? {
        match field.id {
            1 => key = Some(r.read_string()?),
            2 => value = Some(r.read_string()?),
            _ => r.skip(field.wire_type)?,
        }
    }
    Ok(KeyValue {
        key: key.ok_or(MetadataError::MissingField("key"))?,
        value,
    })
}
