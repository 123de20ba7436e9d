use crate::schema::PhysicalType;

/// Errors raised while shredding a record against the schema
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// A required field was absent or explicitly null
    #[error("missing required field `{0}`")]
    MissingRequiredField(String),

    /// A value's variant does not match its leaf's primitive type
    #[error("value for `{path}` is not compatible with {expected}")]
    TypeMismatch {
        /// Dotted path of the offending leaf
        path: String,
        /// The primitive type the schema declares
        expected: PhysicalType,
    },

    /// A fixed-length byte string had the wrong length
    #[error("fixed-length field `{path}` expects {expected} bytes, got {actual}")]
    FixedLenMismatch {
        /// Dotted path of the offending leaf
        path: String,
        /// Length declared by the schema
        expected: usize,
        /// Length of the provided value
        actual: usize,
    },

    /// A group field was given a non-group value
    #[error("field `{0}` is a group and takes a group value")]
    NotAGroup(String),

    /// A repeated field was given a non-list value
    #[error("field `{0}` is repeated and takes a list value")]
    NotAList(String),

    /// A level left its `0..=max` range; raised by validating writers
    #[error("{kind} level {level} out of range 0..={max} for `{path}`")]
    LevelOutOfRange {
        /// `"repetition"` or `"definition"`
        kind: &'static str,
        /// The offending level
        level: u16,
        /// The column's maximum for that level
        max: u16,
        /// Dotted path of the column
        path: String,
    },
}

/// A 96-bit integer stored as three 32-bit words, least-significant first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Int96([u32; 3]);

impl Int96 {
    /// Build from three words, least-significant first
    pub fn new(words: [u32; 3]) -> Self {
        Int96(words)
    }

    /// The three words, least-significant first
    pub fn words(&self) -> [u32; 3] {
        self.0
    }
}

/// A dynamically typed value within a record
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit absence, equivalent to leaving the field out
    Null,
    /// Boolean leaf value
    Bool(bool),
    /// 32-bit integer leaf value
    Int32(i32),
    /// 64-bit integer leaf value
    Int64(i64),
    /// 96-bit integer leaf value
    Int96(Int96),
    /// Single-precision float leaf value
    Float(f32),
    /// Double-precision float leaf value
    Double(f64),
    /// Byte-string leaf value, also used for fixed-length leaves
    Bytes(Vec<u8>),
    /// Nested group value
    Group(Record),
    /// Occurrences of a repeated field
    List(Vec<Value>),
}

impl Value {
    /// Byte-string value from anything byte-like, `&str` included
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(value.into())
    }

    /// List value from an iterator of elements
    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Value::List(values.into_iter().collect())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Bytes(value.as_bytes().to_vec())
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Group(value)
    }
}

/// An ordered set of named field values
///
/// Fields may appear in any order; the shredder looks them up by schema
/// field name. Absent fields and [`Value::Null`] are equivalent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// An empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append of one field
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Append one field
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// All fields in insertion order
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}
