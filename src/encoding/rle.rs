//! Run-length / bit-packed hybrid stream.
//!
//! The stream is a concatenation of runs, each led by an unsigned varint
//! header. A header with a clear low bit, `run_len << 1`, starts an RLE run:
//! the repeated value follows once, on `padded_byte_count(bit_width)`
//! little-endian bytes. A header with a set low bit, `(groups << 1) | 1`,
//! starts a bit-packed run of `groups * 8` values packed at the stream's bit
//! width. A trailing partial group is zero-padded to eight values; readers
//! stop at the page's value count rather than the run boundary.

use super::bitpack;
use super::bytes_util::{padded_byte_count, read_int_le_padded, read_varint, write_int_le_padded, write_varint};
use super::EncodingError;

/// Longest bit-packed run, in groups of eight values
///
/// Capping at 63 groups keeps the run header in a single byte, which lets
/// the encoder reserve the header position and patch it when the run ends.
const MAX_BIT_PACKED_GROUPS: u8 = 63;

/// Consecutive equal values required before an RLE run is worth emitting
const RLE_THRESHOLD: u32 = 8;

/// Streaming encoder for the RLE / bit-packed hybrid format
///
/// Values are buffered eight at a time. Once eight consecutive equal values
/// are seen the encoder commits to an RLE run and keeps counting repeats;
/// anything less regular is packed in groups of eight behind a patched
/// single-byte header. [`RleHybridEncoder::finish`] flushes partial state
/// and resets the encoder for the next stream.
pub struct RleHybridEncoder {
    bit_width: u32,
    buffer: Vec<u8>,
    buffered: [u32; 8],
    num_buffered: usize,
    previous: u32,
    repeat_count: u32,
    packed_groups: u8,
    packed_header_pos: Option<usize>,
}

impl RleHybridEncoder {
    /// Create an encoder for values of at most `bit_width` bits
    pub fn new(bit_width: u32) -> Result<Self, EncodingError> {
        if bit_width > 32 {
            return Err(EncodingError::WidthTooLarge(bit_width));
        }
        Ok(RleHybridEncoder {
            bit_width,
            buffer: Vec::new(),
            buffered: [0; 8],
            num_buffered: 0,
            previous: 0,
            repeat_count: 0,
            packed_groups: 0,
            packed_header_pos: None,
        })
    }

    /// Append one value to the stream
    pub fn write(&mut self, value: u32) -> Result<(), EncodingError> {
        if self.bit_width < 32 && value >> self.bit_width != 0 {
            return Err(EncodingError::ValueOverflow {
                value,
                bit_width: self.bit_width,
            });
        }
        if value == self.previous {
            self.repeat_count += 1;
            if self.repeat_count >= RLE_THRESHOLD {
                // part of a committed RLE run, just keep counting
                return Ok(());
            }
        } else {
            if self.repeat_count >= RLE_THRESHOLD {
                self.write_rle_run();
            }
            self.repeat_count = 1;
            self.previous = value;
        }
        self.buffered[self.num_buffered] = value;
        self.num_buffered += 1;
        if self.num_buffered == 8 {
            self.write_packed_group()?;
        }
        Ok(())
    }

    /// Bytes accumulated so far, including any reserved header byte
    pub fn buffered_size(&self) -> usize {
        self.buffer.len()
    }

    /// Finalize partial state and return the stream, resetting the encoder
    pub fn finish(&mut self) -> Result<Vec<u8>, EncodingError> {
        if self.repeat_count >= RLE_THRESHOLD {
            self.write_rle_run();
        } else if self.num_buffered > 0 {
            // pad the trailing group with zeros; readers stop at value count
            self.buffered[self.num_buffered..].fill(0);
            self.num_buffered = 8;
            self.write_packed_group()?;
            self.end_packed_run();
        } else {
            self.end_packed_run();
        }
        self.previous = 0;
        self.repeat_count = 0;
        self.num_buffered = 0;
        Ok(std::mem::take(&mut self.buffer))
    }

    fn write_rle_run(&mut self) {
        self.end_packed_run();
        write_varint(self.repeat_count << 1, &mut self.buffer);
        write_int_le_padded(self.previous, self.bit_width, &mut self.buffer);
        self.repeat_count = 0;
        self.num_buffered = 0;
    }

    fn write_packed_group(&mut self) -> Result<(), EncodingError> {
        if self.packed_groups == MAX_BIT_PACKED_GROUPS {
            self.end_packed_run();
        }
        if self.packed_header_pos.is_none() {
            // single byte reserved, patched in end_packed_run
            self.buffer.push(0);
            self.packed_header_pos = Some(self.buffer.len() - 1);
        }
        bitpack::pack(&self.buffered, self.bit_width, &mut self.buffer)?;
        self.packed_groups += 1;
        self.num_buffered = 0;
        self.repeat_count = 0;
        Ok(())
    }

    fn end_packed_run(&mut self) {
        if let Some(pos) = self.packed_header_pos.take() {
            self.buffer[pos] = (self.packed_groups << 1) | 1;
            self.packed_groups = 0;
        }
    }
}

/// Decode `count` values from an RLE / bit-packed hybrid stream
///
/// Inverse of [`RleHybridEncoder`]; padding values beyond `count` in the
/// final bit-packed group are discarded.
pub fn decode_rle_hybrid(
    mut input: &[u8],
    bit_width: u32,
    count: usize,
) -> Result<Vec<u32>, EncodingError> {
    if bit_width > 32 {
        return Err(EncodingError::WidthTooLarge(bit_width));
    }
    let mut values = Vec::with_capacity(count);
    while values.len() < count {
        let header = read_varint(&mut input)?;
        if header & 1 == 0 {
            let run_len = (header >> 1) as usize;
            let value = read_int_le_padded(&mut input, bit_width)?;
            values.extend(std::iter::repeat(value).take(run_len));
        } else {
            let group_values = (header >> 1) as usize * 8;
            let byte_len = padded_byte_count((group_values * bit_width as usize) as u32);
            if input.len() < byte_len {
                return Err(EncodingError::Truncated {
                    expected: byte_len - input.len(),
                });
            }
            values.extend(bitpack::unpack(&input[..byte_len], bit_width, group_values)?);
            input = &input[byte_len..];
        }
    }
    values.truncate(count);
    Ok(values)
}
