use super::types::{MessageType, PhysicalType, Repetition, SchemaNode};

/// Descriptor of one leaf column: its path and derived level bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    path: Vec<String>,
    physical_type: PhysicalType,
    type_length: usize,
    max_rep_level: u16,
    max_def_level: u16,
}

impl ColumnDescriptor {
    /// Ordered field names from the root to this leaf
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Dotted rendering of [`ColumnDescriptor::path`], for diagnostics
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }

    /// Storage type of the leaf
    pub fn physical_type(&self) -> PhysicalType {
        self.physical_type
    }

    /// Declared byte length for fixed-length leaves, zero otherwise
    pub fn type_length(&self) -> usize {
        self.type_length
    }

    /// Highest repetition level any value of this column can carry
    pub fn max_rep_level(&self) -> u16 {
        self.max_rep_level
    }

    /// Highest definition level any value of this column can carry
    pub fn max_def_level(&self) -> u16 {
        self.max_def_level
    }
}

/// A validated schema tree flattened into its leaf columns
///
/// Columns appear in depth-first field order, which is also the order column
/// chunks appear within every row group.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    root: MessageType,
    columns: Vec<ColumnDescriptor>,
}

impl SchemaDescriptor {
    /// Flatten `root` into its leaf columns
    pub fn new(root: MessageType) -> Self {
        let mut columns = Vec::new();
        let mut path = Vec::new();
        for field in root.fields() {
            collect_leaves(field, &mut path, 0, 0, &mut columns);
        }
        SchemaDescriptor { root, columns }
    }

    /// The schema tree this descriptor was built from
    pub fn root(&self) -> &MessageType {
        &self.root
    }

    /// Leaf columns in schema order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Number of leaf columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Descriptor of the leaf at `index` in schema order
    pub fn column(&self, index: usize) -> &ColumnDescriptor {
        &self.columns[index]
    }
}

fn collect_leaves(
    node: &SchemaNode,
    path: &mut Vec<String>,
    rep: u16,
    def: u16,
    out: &mut Vec<ColumnDescriptor>,
) {
    let rep = rep + u16::from(node.repetition() == Repetition::Repeated);
    let def = def + u16::from(node.repetition() != Repetition::Required);
    path.push(node.name().to_string());
    match node {
        SchemaNode::Primitive {
            physical_type,
            type_length,
            ..
        } => out.push(ColumnDescriptor {
            path: path.clone(),
            physical_type: *physical_type,
            type_length: *type_length,
            max_rep_level: rep,
            max_def_level: def,
        }),
        SchemaNode::Group { children, .. } => {
            for child in children {
                collect_leaves(child, path, rep, def, out);
            }
        }
    }
    path.pop();
}
