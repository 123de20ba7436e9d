//! # Schema Tree
//!
//! A file's schema is an immutable rooted tree: [`MessageType`] is the root,
//! each node is either a group of named fields or a primitive leaf, and every
//! non-root node carries a [`Repetition`]. Leaves are the unit of encoding;
//! [`SchemaDescriptor`] flattens the tree into one [`ColumnDescriptor`] per
//! leaf in depth-first field order, precomputing the dotted path and the
//! maximum repetition/definition levels the shredder and column writers rely
//! on.
//!
//! ## Level derivation
//!
//! Walking from the root to a leaf, every `Repeated` ancestor (the leaf
//! included) raises the maximum repetition level by one, and every ancestor
//! that is not `Required` raises the maximum definition level by one. A value
//! is present in a record exactly when its definition level equals the leaf's
//! maximum.

mod descriptor;
mod types;


pub use descriptor::{ColumnDescriptor, SchemaDescriptor};
pub use types::{MessageType, PhysicalType, Repetition, SchemaError, SchemaNode};
