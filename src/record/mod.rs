//! # Records and Shredding
//!
//! The input side of the write path: a small dynamic value model
//! ([`Record`], [`Value`]) that adapters produce from their native
//! representation, and the [`RecordShredder`] that walks a record against
//! the schema tree and emits one `(value, repetition, definition)` triple
//! per leaf occurrence into a [`ShredConsumer`].
//!
//! Shredding contracts:
//!
//! - Every leaf is visited for every record; an absent branch produces
//!   exactly one null triple per leaf, carrying the definition level of the
//!   deepest present ancestor.
//! - The first triple a record contributes to a leaf has repetition level
//!   zero; later occurrences carry the level of the innermost repeated
//!   group that advanced.
//! - Missing required fields fail with [`RecordError::MissingRequiredField`].

mod shredder;
mod value;


pub use shredder::{RecordShredder, ShredConsumer};
pub use value::{Int96, Record, RecordError, Value};
