//! # Value and Level Encoders
//!
//! Everything that turns buffered values into compact byte streams:
//!
//! - [`bitpack`]: pack/unpack unsigned integers of width 0..=32 bits,
//!   little-endian, least-significant bit first within each byte.
//! - [`bytes_util`]: unsigned varints, width arithmetic and the padded
//!   little-endian integer writes the hybrid format relies on.
//! - [`RleHybridEncoder`]: the run-length / bit-packed hybrid stream used for
//!   repetition levels, definition levels and dictionary ids.
//! - [`PlainEncoder`]: fixed-width little-endian and length-prefixed binary
//!   values, with booleans packed eight to a byte.
//! - [`DictionaryEncoder`]: insertion-ordered value deduplication with a
//!   PLAIN dictionary page and budget-driven fallback to plain encoding.
//! - [`LevelEncoder`]: width selection and length-prefix framing for level
//!   streams.
//!
//! Encoders never touch the sink; they hand finished byte buffers to the
//! column machinery, which frames them into pages.

pub mod bitpack;
pub mod bytes_util;

mod dictionary;
mod levels;
mod plain;
mod rle;


pub use dictionary::{DictionaryEncoder, DictionaryPage};
pub use levels::LevelEncoder;
pub use plain::PlainEncoder;
pub use rle::{decode_rle_hybrid, RleHybridEncoder};

/// Errors raised by the encoding layer
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// A bit width above 32 was requested for a packed integer stream
    #[error("bit width {0} exceeds the 32-bit packing limit")]
    WidthTooLarge(u32),

    /// A value does not fit in the declared bit width
    #[error("value {value} does not fit in {bit_width} bits")]
    ValueOverflow {
        /// The offending value
        value: u32,
        /// The declared width of the stream
        bit_width: u32,
    },

    /// A varint ran past the five-byte limit for 32-bit values
    #[error("malformed varint: more than 5 bytes for a 32-bit value")]
    MalformedVarInt,

    /// A stream ended before the decoder read everything it needed
    #[error("truncated stream: expected {expected} more bytes")]
    Truncated {
        /// How many further bytes were required
        expected: usize,
    },
}

/// Encodings a page or column chunk can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Encoding {
    /// Fixed-width little-endian values, length-prefixed binary
    Plain,
    /// Dictionary ids in data pages, PLAIN dictionary page
    PlainDictionary,
    /// Run-length / bit-packed hybrid
    Rle,
    /// Deprecated pure bit-packing, reported for empty level streams
    BitPacked,
    /// Dictionary ids under an RLE-hybrid stream, newer dictionary flavour
    RleDictionary,
}

impl Encoding {
    /// Integer code used in the footer wire format
    pub(crate) fn code(self) -> i32 {
        match self {
            Encoding::Plain => 0,
            Encoding::PlainDictionary => 2,
            Encoding::Rle => 3,
            Encoding::BitPacked => 4,
            Encoding::RleDictionary => 8,
        }
    }

    /// Inverse of [`Encoding::code`]
    pub(crate) fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Encoding::Plain,
            2 => Encoding::PlainDictionary,
            3 => Encoding::Rle,
            4 => Encoding::BitPacked,
            8 => Encoding::RleDictionary,
            _ => return None,
        })
    }
}
