//! Bit-packing of unsigned integers at widths 0..=32, little-endian with the
//! least-significant bit first within each byte. The final byte of a packed
//! run is zero-padded on the high side, so a sequence of `n` values at width
//! `w` always occupies exactly `ceil(n * w / 8)` bytes.

use super::bytes_util::padded_byte_count;
use super::EncodingError;

/// Append `values` packed at `bit_width` bits each to `out`
///
/// A width of zero emits nothing and requires every value to be zero; any
/// value that does not fit in `bit_width` bits fails with
/// [`EncodingError::ValueOverflow`].
pub fn pack(values: &[u32], bit_width: u32, out: &mut Vec<u8>) -> Result<(), EncodingError> {
    if bit_width > 32 {
        return Err(EncodingError::WidthTooLarge(bit_width));
    }
    out.reserve(padded_byte_count(bit_width * values.len() as u32));
    let mut acc: u64 = 0;
    let mut pending_bits: u32 = 0;
    for &value in values {
        if bit_width < 32 && value >> bit_width != 0 {
            return Err(EncodingError::ValueOverflow { value, bit_width });
        }
        acc |= u64::from(value) << pending_bits;
        pending_bits += bit_width;
        while pending_bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            pending_bits -= 8;
        }
    }
    if pending_bits > 0 {
        out.push(acc as u8);
    }
    Ok(())
}

/// Unpack `count` values of `bit_width` bits each from `input`
///
/// Exact inverse of [`pack`]: trailing padding bits are ignored.
pub fn unpack(input: &[u8], bit_width: u32, count: usize) -> Result<Vec<u32>, EncodingError> {
    if bit_width > 32 {
        return Err(EncodingError::WidthTooLarge(bit_width));
    }
    let needed = padded_byte_count(bit_width * count as u32);
    if input.len() < needed {
        return Err(EncodingError::Truncated {
            expected: needed - input.len(),
        });
    }
    if bit_width == 0 {
        return Ok(vec![0; count]);
    }
    let mask = if bit_width == 32 {
        u64::from(u32::MAX)
    } else {
        (1u64 << bit_width) - 1
    };
    let mut values = Vec::with_capacity(count);
    let mut acc: u64 = 0;
    let mut buffered_bits: u32 = 0;
    let mut pos = 0;
    for _ in 0..count {
        while buffered_bits < bit_width {
            acc |= u64::from(input[pos]) << buffered_bits;
            pos += 1;
            buffered_bits += 8;
        }
        values.push((acc & mask) as u32);
        acc >>= bit_width;
        buffered_bits -= bit_width;
    }
    Ok(values)
}
