use std::collections::HashSet;
use std::fmt;

/// Errors raised while constructing or validating a schema
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Two sibling fields share a name
    #[error("duplicate field name `{name}` in group `{group}`")]
    DuplicateField {
        /// The colliding field name
        name: String,
        /// The group that contains both fields
        group: String,
    },

    /// A group node was declared without children
    #[error("group `{0}` has no fields")]
    EmptyGroup(String),

    /// A fixed-length leaf was declared without a positive byte length
    #[error("fixed-length leaf `{0}` must declare a positive type length")]
    MissingTypeLength(String),
}

/// Primitive storage type of a leaf column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    /// Single bit, packed eight values per byte
    Boolean,
    /// 32-bit two's complement integer, little-endian
    Int32,
    /// 64-bit two's complement integer, little-endian
    Int64,
    /// 96-bit integer stored as three little-endian 32-bit words
    Int96,
    /// IEEE-754 single precision, little-endian
    Float,
    /// IEEE-754 double precision, little-endian
    Double,
    /// Variable-length byte string, length-prefixed in PLAIN encoding
    ByteArray,
    /// Byte string whose length is fixed by the schema
    FixedLenByteArray,
}

impl PhysicalType {
    /// Integer code used in the footer wire format
    pub(crate) fn code(self) -> i32 {
        match self {
            PhysicalType::Boolean => 0,
            PhysicalType::Int32 => 1,
            PhysicalType::Int64 => 2,
            PhysicalType::Int96 => 3,
            PhysicalType::Float => 4,
            PhysicalType::Double => 5,
            PhysicalType::ByteArray => 6,
            PhysicalType::FixedLenByteArray => 7,
        }
    }

    /// Inverse of [`PhysicalType::code`]
    pub(crate) fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => PhysicalType::Boolean,
            1 => PhysicalType::Int32,
            2 => PhysicalType::Int64,
            3 => PhysicalType::Int96,
            4 => PhysicalType::Float,
            5 => PhysicalType::Double,
            6 => PhysicalType::ByteArray,
            7 => PhysicalType::FixedLenByteArray,
            _ => return None,
        })
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhysicalType::Boolean => "BOOLEAN",
            PhysicalType::Int32 => "INT32",
            PhysicalType::Int64 => "INT64",
            PhysicalType::Int96 => "INT96",
            PhysicalType::Float => "FLOAT",
            PhysicalType::Double => "DOUBLE",
            PhysicalType::ByteArray => "BYTE_ARRAY",
            PhysicalType::FixedLenByteArray => "FIXED_LEN_BYTE_ARRAY",
        };
        f.write_str(name)
    }
}

/// How many times a field may appear within its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    /// Exactly once
    Required,
    /// Zero or one time
    Optional,
    /// Zero or more times
    Repeated,
}

impl Repetition {
    /// Integer code used in the footer wire format
    pub(crate) fn code(self) -> i32 {
        match self {
            Repetition::Required => 0,
            Repetition::Optional => 1,
            Repetition::Repeated => 2,
        }
    }

    /// Inverse of [`Repetition::code`]
    pub(crate) fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Repetition::Required,
            1 => Repetition::Optional,
            2 => Repetition::Repeated,
            _ => return None,
        })
    }
}

impl fmt::Display for Repetition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Repetition::Required => "required",
            Repetition::Optional => "optional",
            Repetition::Repeated => "repeated",
        };
        f.write_str(name)
    }
}

/// A node of the schema tree: a primitive leaf or a group of named fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    /// A leaf carrying a primitive type
    Primitive {
        /// Field name, unique among siblings
        name: String,
        /// Occurrence rule within the parent
        repetition: Repetition,
        /// Storage type of the column
        physical_type: PhysicalType,
        /// Byte length for `FixedLenByteArray` leaves, zero otherwise
        type_length: usize,
    },
    /// An interior node with ordered, named children
    Group {
        /// Field name, unique among siblings
        name: String,
        /// Occurrence rule within the parent
        repetition: Repetition,
        /// Ordered child nodes
        children: Vec<SchemaNode>,
    },
}

impl SchemaNode {
    /// Create a primitive leaf
    pub fn primitive(
        name: impl Into<String>,
        repetition: Repetition,
        physical_type: PhysicalType,
    ) -> Self {
        SchemaNode::Primitive {
            name: name.into(),
            repetition,
            physical_type,
            type_length: 0,
        }
    }

    /// Create a fixed-length byte-array leaf of `type_length` bytes
    pub fn fixed_len(name: impl Into<String>, repetition: Repetition, type_length: usize) -> Self {
        SchemaNode::Primitive {
            name: name.into(),
            repetition,
            physical_type: PhysicalType::FixedLenByteArray,
            type_length,
        }
    }

    /// Create a group with the given children
    pub fn group(
        name: impl Into<String>,
        repetition: Repetition,
        children: Vec<SchemaNode>,
    ) -> Self {
        SchemaNode::Group {
            name: name.into(),
            repetition,
            children,
        }
    }

    /// Field name of this node
    pub fn name(&self) -> &str {
        match self {
            SchemaNode::Primitive { name, .. } | SchemaNode::Group { name, .. } => name,
        }
    }

    /// Occurrence rule of this node within its parent
    pub fn repetition(&self) -> Repetition {
        match self {
            SchemaNode::Primitive { repetition, .. } | SchemaNode::Group { repetition, .. } => {
                *repetition
            }
        }
    }

    /// Whether this node is a primitive leaf
    pub fn is_primitive(&self) -> bool {
        matches!(self, SchemaNode::Primitive { .. })
    }

    fn validate(&self) -> Result<(), SchemaError> {
        match self {
            SchemaNode::Primitive {
                name,
                physical_type,
                type_length,
                ..
            } => {
                if *physical_type == PhysicalType::FixedLenByteArray && *type_length == 0 {
                    return Err(SchemaError::MissingTypeLength(name.clone()));
                }
                Ok(())
            }
            SchemaNode::Group { name, children, .. } => {
                if children.is_empty() {
                    return Err(SchemaError::EmptyGroup(name.clone()));
                }
                check_unique_names(name, children)?;
                children.iter().try_for_each(SchemaNode::validate)
            }
        }
    }
}

fn check_unique_names(group: &str, children: &[SchemaNode]) -> Result<(), SchemaError> {
    let mut seen = HashSet::with_capacity(children.len());
    for child in children {
        if !seen.insert(child.name()) {
            return Err(SchemaError::DuplicateField {
                name: child.name().to_string(),
                group: group.to_string(),
            });
        }
    }
    Ok(())
}

/// Root of a schema tree
///
/// The root behaves like a `Required` group whose repetition is never
/// serialized. Construction validates the whole tree: sibling names are
/// unique, groups are non-empty and fixed-length leaves declare a length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageType {
    name: String,
    fields: Vec<SchemaNode>,
}

impl MessageType {
    /// Build and validate a schema rooted at `name`
    pub fn new(name: impl Into<String>, fields: Vec<SchemaNode>) -> Result<Self, SchemaError> {
        let name = name.into();
        if fields.is_empty() {
            return Err(SchemaError::EmptyGroup(name));
        }
        check_unique_names(&name, &fields)?;
        fields.iter().try_for_each(SchemaNode::validate)?;
        Ok(MessageType { name, fields })
    }

    /// Name of the root message
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level fields in declaration order
    pub fn fields(&self) -> &[SchemaNode] {
        &self.fields
    }
}
