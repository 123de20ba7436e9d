//! Dictionary encoding: deduplicate values into an insertion-ordered
//! dictionary, emit data pages of small integer ids and a PLAIN-encoded
//! dictionary page for the chunk.

use std::collections::HashMap;

use super::bytes_util::bits_needed;
use super::plain::PlainEncoder;
use super::rle::RleHybridEncoder;
use super::{Encoding, EncodingError};
use crate::record::Int96;

/// A dictionary page ready to be framed at the head of a column chunk
#[derive(Debug, Clone)]
pub struct DictionaryPage {
    /// PLAIN encoding of the dictionary values in id order
    pub buffer: Vec<u8>,
    /// Number of dictionary entries
    pub num_values: u32,
    /// Encoding tag recorded in the page header
    pub encoding: Encoding,
}

/// Dictionary keys; floats are hashed by bit pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DictEntry {
    I32(i32),
    I64(i64),
    I96([u32; 3]),
    F32(u32),
    F64(u64),
    Bytes(Vec<u8>),
    FixedBytes(Vec<u8>),
}

impl DictEntry {
    /// PLAIN-encoded size, used against the dictionary byte budget
    fn encoded_size(&self) -> usize {
        match self {
            DictEntry::I32(_) | DictEntry::F32(_) => 4,
            DictEntry::I64(_) | DictEntry::F64(_) => 8,
            DictEntry::I96(_) => 12,
            DictEntry::Bytes(b) => 4 + b.len(),
            DictEntry::FixedBytes(b) => b.len(),
        }
    }

    fn encode_into(&self, encoder: &mut PlainEncoder) {
        match self {
            DictEntry::I32(v) => encoder.write_i32(*v),
            DictEntry::I64(v) => encoder.write_i64(*v),
            DictEntry::I96(words) => encoder.write_int96(Int96::new(*words)),
            DictEntry::F32(bits) => encoder.write_f32(f32::from_bits(*bits)),
            DictEntry::F64(bits) => encoder.write_f64(f64::from_bits(*bits)),
            DictEntry::Bytes(b) => encoder.write_bytes(b),
            DictEntry::FixedBytes(b) => encoder.write_fixed_bytes(b),
        }
    }
}

/// Value encoder that builds a per-chunk dictionary
///
/// `add` assigns ids in insertion order and buffers one id per value; ids go
/// out as data pages of a one-byte bit width followed by an RLE-hybrid
/// stream. When inserting a value would push the PLAIN-encoded dictionary
/// past its byte budget the encoder falls back: ids buffered for the current
/// page are replayed through a PLAIN encoder using the captured dictionary,
/// and every later value is written PLAIN. The dictionary page survives the
/// fallback only when earlier pages of the chunk already went out
/// dictionary-encoded, in which case the chunk carries mixed encodings.
pub struct DictionaryEncoder {
    map: HashMap<DictEntry, u32>,
    entries: Vec<DictEntry>,
    ids: Vec<u32>,
    dict_byte_size: usize,
    byte_budget: usize,
    id_pages_flushed: usize,
    plain: Option<PlainEncoder>,
}

impl DictionaryEncoder {
    /// Create an encoder whose dictionary may grow to `byte_budget` bytes
    pub fn new(byte_budget: usize) -> Self {
        DictionaryEncoder {
            map: HashMap::new(),
            entries: Vec::new(),
            ids: Vec::new(),
            dict_byte_size: 0,
            byte_budget,
            id_pages_flushed: 0,
            plain: None,
        }
    }

    /// Whether the encoder has fallen back to PLAIN for this chunk
    pub fn fell_back(&self) -> bool {
        self.plain.is_some()
    }

    /// Append a 32-bit integer
    pub fn write_i32(&mut self, value: i32) {
        self.write_entry(DictEntry::I32(value));
    }

    /// Append a 64-bit integer
    pub fn write_i64(&mut self, value: i64) {
        self.write_entry(DictEntry::I64(value));
    }

    /// Append a 96-bit integer
    pub fn write_int96(&mut self, value: Int96) {
        self.write_entry(DictEntry::I96(value.words()));
    }

    /// Append a single-precision float
    pub fn write_f32(&mut self, value: f32) {
        self.write_entry(DictEntry::F32(value.to_bits()));
    }

    /// Append a double-precision float
    pub fn write_f64(&mut self, value: f64) {
        self.write_entry(DictEntry::F64(value.to_bits()));
    }

    /// Append a variable-length byte string
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_entry(DictEntry::Bytes(value.to_vec()));
    }

    /// Append a fixed-length byte string
    pub fn write_fixed_bytes(&mut self, value: &[u8]) {
        self.write_entry(DictEntry::FixedBytes(value.to_vec()));
    }

    fn write_entry(&mut self, entry: DictEntry) {
        if let Some(plain) = &mut self.plain {
            entry.encode_into(plain);
            return;
        }
        if let Some(&id) = self.map.get(&entry) {
            self.ids.push(id);
            return;
        }
        if self.dict_byte_size + entry.encoded_size() > self.byte_budget {
            let plain = self.fall_back_to_plain();
            entry.encode_into(plain);
            return;
        }
        let id = self.entries.len() as u32;
        self.dict_byte_size += entry.encoded_size();
        self.map.insert(entry.clone(), id);
        self.entries.push(entry);
        self.ids.push(id);
    }

    /// Replay the ids buffered for the current page as PLAIN values
    fn fall_back_to_plain(&mut self) -> &mut PlainEncoder {
        log::debug!(
            "dictionary of {} entries ({} bytes) exceeded budget {}, falling back to plain",
            self.entries.len(),
            self.dict_byte_size,
            self.byte_budget
        );
        let mut plain = PlainEncoder::new();
        for &id in &self.ids {
            self.entries[id as usize].encode_into(&mut plain);
        }
        self.ids.clear();
        if self.id_pages_flushed == 0 {
            // nothing dictionary-encoded reached a page, chunk is pure PLAIN
            self.map.clear();
            self.entries.clear();
            self.dict_byte_size = 0;
        }
        self.plain.insert(plain)
    }

    /// Estimated bytes buffered for the current page
    pub fn buffered_size(&self) -> usize {
        match &self.plain {
            Some(plain) => plain.buffered_size(),
            None => self.ids.len() * 4,
        }
    }

    /// Estimated bytes held in total, the dictionary included
    pub fn allocated_size(&self) -> usize {
        self.buffered_size() + self.dict_byte_size
    }

    /// Finalize the current page's values and reset for the next page
    ///
    /// Returns the value byte stream and the encoding to record for it.
    pub fn page_bytes(&mut self) -> Result<(Vec<u8>, Encoding), EncodingError> {
        if let Some(plain) = &mut self.plain {
            return Ok((plain.finish(), Encoding::Plain));
        }
        let max_id = self.entries.len().saturating_sub(1) as u32;
        let bit_width = bits_needed(max_id).max(1);
        let mut encoder = RleHybridEncoder::new(bit_width)?;
        for &id in &self.ids {
            encoder.write(id)?;
        }
        self.ids.clear();
        let rle = encoder.finish()?;
        let mut bytes = Vec::with_capacity(1 + rle.len());
        bytes.push(bit_width as u8);
        bytes.extend_from_slice(&rle);
        self.id_pages_flushed += 1;
        Ok((bytes, Encoding::PlainDictionary))
    }

    /// The chunk's dictionary page, if one should be written
    ///
    /// `None` when the dictionary is empty or the chunk fell back before any
    /// dictionary-encoded page was flushed.
    pub fn dictionary_page(&mut self) -> Option<DictionaryPage> {
        if self.entries.is_empty() || (self.fell_back() && self.id_pages_flushed == 0) {
            return None;
        }
        let mut encoder = PlainEncoder::new();
        for entry in &self.entries {
            entry.encode_into(&mut encoder);
        }
        Some(DictionaryPage {
            buffer: encoder.finish(),
            num_values: self.entries.len() as u32,
            encoding: Encoding::PlainDictionary,
        })
    }
}
