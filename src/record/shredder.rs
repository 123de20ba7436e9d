use super::value::{Record, RecordError, Value};
use crate::schema::{MessageType, Repetition, SchemaNode};
use crate::writer::WriterError;

/// Receives the per-leaf triples the shredder emits
///
/// Leaves are numbered in schema order; within one record, triples for one
/// leaf arrive in occurrence order.
pub trait ShredConsumer {
    /// A present value with its repetition and definition levels
    fn write_value(
        &mut self,
        leaf: usize,
        value: &Value,
        rep: u16,
        def: u16,
    ) -> Result<(), WriterError>;

    /// An absent value: levels only
    fn write_null(&mut self, leaf: usize, rep: u16, def: u16) -> Result<(), WriterError>;
}

/// Walks nested records against a schema tree, emitting one
/// `(value, rep, def)` triple per leaf occurrence
///
/// The walk follows schema field order, not record field order, so column
/// triples always line up with the descriptor's leaf numbering. The
/// definition level handed down a branch counts the non-required ancestors
/// that are present; a missing branch emits one null triple per leaf under
/// it carrying that count unchanged.
pub struct RecordShredder<'a> {
    schema: &'a MessageType,
}

impl<'a> RecordShredder<'a> {
    /// Create a shredder for `schema`
    pub fn new(schema: &'a MessageType) -> Self {
        RecordShredder { schema }
    }

    /// Shred one record into `consumer`
    pub fn shred<C: ShredConsumer>(
        &self,
        record: &Record,
        consumer: &mut C,
    ) -> Result<(), WriterError> {
        let mut walk = Walk {
            consumer,
            leaf: 0,
            path: Vec::new(),
        };
        for field in self.schema.fields() {
            walk.field(field, record.field(field.name()), 0, 0, 0)?;
        }
        Ok(())
    }
}

struct Walk<'a, C> {
    consumer: &'a mut C,
    leaf: usize,
    path: Vec<&'a str>,
}

impl<'a, C: ShredConsumer> Walk<'a, C> {
    /// Dispatch one schema field against the value found in the record
    ///
    /// `rep` is the repetition level this occurrence carries, `def` the
    /// definition contribution of present ancestors, and `rep_depth` the
    /// count of repeated ancestors of the field's parent.
    fn field(
        &mut self,
        node: &'a SchemaNode,
        value: Option<&Value>,
        rep: u16,
        def: u16,
        rep_depth: u16,
    ) -> Result<(), WriterError> {
        self.path.push(node.name());
        let result = self.field_inner(node, value, rep, def, rep_depth);
        self.path.pop();
        result
    }

    fn field_inner(
        &mut self,
        node: &'a SchemaNode,
        value: Option<&Value>,
        rep: u16,
        def: u16,
        rep_depth: u16,
    ) -> Result<(), WriterError> {
        match node.repetition() {
            Repetition::Required => match value {
                Some(value) if !matches!(value, Value::Null) => {
                    self.present(node, value, rep, def, rep_depth)
                }
                _ => Err(RecordError::MissingRequiredField(self.path.join(".")).into()),
            },
            Repetition::Optional => match value {
                None | Some(Value::Null) => self.null_subtree(node, rep, def),
                Some(value) => self.present(node, value, rep, def + 1, rep_depth),
            },
            Repetition::Repeated => {
                let items = match value {
                    None | Some(Value::Null) => return self.null_subtree(node, rep, def),
                    Some(Value::List(items)) => items,
                    Some(_) => return Err(RecordError::NotAList(self.path.join(".")).into()),
                };
                if items.is_empty() {
                    return self.null_subtree(node, rep, def);
                }
                let own_rep = rep_depth + 1;
                let base = self.leaf;
                for (index, item) in items.iter().enumerate() {
                    self.leaf = base;
                    let item_rep = if index == 0 { rep } else { own_rep };
                    self.present(node, item, item_rep, def + 1, rep_depth)?;
                }
                Ok(())
            }
        }
    }

    /// Walk a node whose occurrence is present
    fn present(
        &mut self,
        node: &'a SchemaNode,
        value: &Value,
        rep: u16,
        def: u16,
        rep_depth: u16,
    ) -> Result<(), WriterError> {
        let rep_depth = rep_depth + u16::from(node.repetition() == Repetition::Repeated);
        match node {
            SchemaNode::Primitive { .. } => {
                self.consumer.write_value(self.leaf, value, rep, def)?;
                self.leaf += 1;
                Ok(())
            }
            SchemaNode::Group { children, .. } => {
                let record = match value {
                    Value::Group(record) => record,
                    _ => return Err(RecordError::NotAGroup(self.path.join(".")).into()),
                };
                for child in children {
                    self.field(child, record.field(child.name()), rep, def, rep_depth)?;
                }
                Ok(())
            }
        }
    }

    /// Emit one null triple per leaf under an absent branch
    fn null_subtree(&mut self, node: &'a SchemaNode, rep: u16, def: u16) -> Result<(), WriterError> {
        match node {
            SchemaNode::Primitive { .. } => {
                self.consumer.write_null(self.leaf, rep, def)?;
                self.leaf += 1;
                Ok(())
            }
            SchemaNode::Group { children, .. } => {
                for child in children {
                    self.null_subtree(child, rep, def)?;
                }
                Ok(())
            }
        }
    }
}
