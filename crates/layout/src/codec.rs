//! Value codec.
//!
//! Encodes value types into byte ranges of a word and back, and implements
//! the short/long encoding of strings and byte sequences.
//!
//! # String and bytes layout
//!
//! **Short (≤31 bytes)**, stored inline in the base slot:
//! - data bytes left-aligned from the high-order end
//! - lowest-order byte: `length * 2` (bit 0 clear)
//!
//! **Long (≥32 bytes)**:
//! - base slot: `length * 2 + 1` right-aligned (bit 0 set)
//! - data: 32-byte chunks at `H(pad32(base_slot)) + i`, last chunk zero-padded

use crate::allocator::{ScalarKind, TypeLayout};
use crate::error::{LayoutError, Result};
use slotscope_core::{pad32, Address, Slot, SlotHasher, Value, Word, I256, U256};
use slotscope_storage::WordStore;
use std::ops::Range;
use tracing::warn;

/// Longest byte sequence that fits the short encoding.
pub const MAX_SHORT_LENGTH: usize = 31;

/// Upper bound on decoded long lengths; larger headers are treated as corrupt.
pub const MAX_LONG_LENGTH: usize = u32::MAX as usize;

/// Index range inside the big-endian word for `width` bytes at `offset`
/// counted from the low-order end.
fn byte_range(offset: u8, width: u8) -> Result<Range<usize>> {
    let end = 32usize
        .checked_sub(usize::from(offset))
        .ok_or(LayoutError::ByteRange { offset, width })?;
    let start = end
        .checked_sub(usize::from(width))
        .ok_or(LayoutError::ByteRange { offset, width })?;
    if width == 0 {
        return Err(LayoutError::ByteRange { offset, width });
    }
    Ok(start..end)
}

/// Read `width` bytes at `offset` (from the low-order end) of a word.
pub fn read_scalar(word: &Word, offset: u8, width: u8) -> Result<Vec<u8>> {
    let range = byte_range(offset, width)?;
    Ok(word.0[range].to_vec())
}

/// Return a copy of `word` with `width` bytes at `offset` replaced by `value`.
///
/// `value` is big-endian; shorter inputs are left-padded with zeros.
pub fn write_scalar(word: &Word, offset: u8, width: u8, value: &[u8]) -> Result<Word> {
    let range = byte_range(offset, width)?;
    if value.len() > usize::from(width) {
        return Err(LayoutError::EncodingOverflow {
            value: format!("0x{}", hex::encode(value)),
            width,
        });
    }
    let mut out = *word;
    let field = &mut out.0[range];
    let pad = field.len() - value.len();
    field[..pad].fill(0);
    field[pad..].copy_from_slice(value);
    Ok(out)
}

fn mismatch(expected: &str, value: &Value) -> LayoutError {
    LayoutError::ValueTypeMismatch {
        expected: expected.to_string(),
        found: value.kind_name().to_string(),
    }
}

fn kind_label(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Uint => "uint",
        ScalarKind::Int => "int",
        ScalarKind::Bool => "bool",
        ScalarKind::Address => "address",
        ScalarKind::FixedBytes => "fixed bytes",
    }
}

/// Encode a value type into exactly `width` big-endian bytes.
pub fn encode_scalar(kind: ScalarKind, width: u8, value: &Value) -> Result<Vec<u8>> {
    let w = usize::from(width);
    match (kind, value) {
        (ScalarKind::Uint, Value::Uint(v)) => {
            if v.bit_len() > w * 8 {
                return Err(LayoutError::EncodingOverflow {
                    value: v.to_string(),
                    width,
                });
            }
            Ok(v.to_be_bytes::<32>()[32 - w..].to_vec())
        }
        (ScalarKind::Int, Value::Int(v)) => {
            let raw = v.into_raw().to_be_bytes::<32>();
            let (head, tail) = raw.split_at(32 - w);
            let sign = if tail[0] & 0x80 != 0 { 0xff } else { 0x00 };
            if head.iter().any(|b| *b != sign) {
                return Err(LayoutError::EncodingOverflow {
                    value: v.to_string(),
                    width,
                });
            }
            Ok(tail.to_vec())
        }
        (ScalarKind::Bool, Value::Bool(b)) => Ok(vec![u8::from(*b)]),
        (ScalarKind::Address, Value::Address(a)) => Ok(a.0.to_vec()),
        (ScalarKind::FixedBytes, Value::FixedBytes(bytes)) => {
            if bytes.len() > w {
                return Err(LayoutError::EncodingOverflow {
                    value: format!("0x{}", hex::encode(bytes)),
                    width,
                });
            }
            let mut out = bytes.clone();
            out.resize(w, 0);
            Ok(out)
        }
        (kind, value) => Err(mismatch(kind_label(kind), value)),
    }
}

/// Decode the `width` bytes of a value type.
pub fn decode_scalar(kind: ScalarKind, bytes: &[u8]) -> Value {
    match kind {
        ScalarKind::Uint => Value::Uint(U256::from_be_slice(bytes)),
        ScalarKind::Int => {
            let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
            let mut buf = if negative { [0xffu8; 32] } else { [0u8; 32] };
            buf[32 - bytes.len()..].copy_from_slice(bytes);
            Value::Int(I256::from_raw(U256::from_be_bytes(buf)))
        }
        ScalarKind::Bool => Value::Bool(bytes.iter().any(|b| *b != 0)),
        ScalarKind::Address => Value::Address(Address::from_slice(&pad32(bytes)[12..])),
        ScalarKind::FixedBytes => Value::FixedBytes(bytes.to_vec()),
    }
}

/// Encode a mapping key into the bytes hashed alongside the mapping slot.
///
/// Value types are padded to a full word: integers, booleans and addresses
/// are left-padded (signed integers sign-extended), fixed bytes are
/// right-padded. Strings and bytes are hashed as-is, without padding.
pub fn encode_key(key: &TypeLayout, value: &Value) -> Result<Vec<u8>> {
    match key {
        TypeLayout::Scalar { kind, width } => {
            let raw = encode_scalar(*kind, *width, value)?;
            let mut word = match kind {
                ScalarKind::Int if raw[0] & 0x80 != 0 => [0xffu8; 32],
                _ => [0u8; 32],
            };
            match kind {
                ScalarKind::FixedBytes => word[..raw.len()].copy_from_slice(&raw),
                _ => word[32 - raw.len()..].copy_from_slice(&raw),
            }
            Ok(word.to_vec())
        }
        TypeLayout::String => match value {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => Err(mismatch("string", other)),
        },
        TypeLayout::Bytes => match value {
            Value::Bytes(b) => Ok(b.clone()),
            other => Err(mismatch("bytes", other)),
        },
        other => Err(LayoutError::InvalidType(format!(
            "{} cannot be used as a mapping key",
            other.kind_name()
        ))),
    }
}

/// Decoded control word of a string or byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytesHeader {
    /// Data inline in the base word.
    Short(usize),
    /// Data in continuation words.
    Long(usize),
}

impl BytesHeader {
    pub fn len(&self) -> usize {
        match self {
            BytesHeader::Short(len) | BytesHeader::Long(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Continuation words used by this encoding.
    pub fn data_words(&self) -> usize {
        match self {
            BytesHeader::Short(_) => 0,
            BytesHeader::Long(len) => len.div_ceil(32),
        }
    }
}

/// Encode up to 31 bytes inline: data left-aligned, `len * 2` in the lowest byte.
pub fn encode_short(data: &[u8]) -> Result<Word> {
    if data.len() > MAX_SHORT_LENGTH {
        return Err(LayoutError::EncodingOverflow {
            value: format!("{} bytes", data.len()),
            width: MAX_SHORT_LENGTH as u8,
        });
    }
    let mut word = [0u8; 32];
    word[..data.len()].copy_from_slice(data);
    word[31] = (data.len() * 2) as u8;
    Ok(Word(word))
}

/// Encode the base word of a long sequence: `len * 2 + 1`.
pub fn encode_long_header(len: usize) -> Word {
    Word::from_u256(U256::from(len) * U256::from(2) + U256::from(1))
}

/// Decode the base word of a string or byte sequence.
///
/// The discriminant is the lowest bit: clear for short, set for long. A
/// short header claiming more than 31 bytes, or a long header claiming fewer
/// than 32, is rejected.
pub fn decode_header(slot: &Slot, word: &Word) -> Result<BytesHeader> {
    let corrupt = |reason: String| LayoutError::CorruptEncoding {
        slot: *slot,
        reason,
    };

    if word.low_byte() & 1 == 0 {
        let len = usize::from(word.low_byte() / 2);
        if len > MAX_SHORT_LENGTH {
            return Err(corrupt(format!("short length {} exceeds 31", len)));
        }
        return Ok(BytesHeader::Short(len));
    }

    let len = word.to_u256() / U256::from(2);
    if len > U256::from(MAX_LONG_LENGTH) {
        return Err(corrupt(format!("long length {} out of range", len)));
    }
    let len = len.to::<usize>();
    if len <= MAX_SHORT_LENGTH {
        return Err(corrupt(format!("long encoding with short length {}", len)));
    }
    Ok(BytesHeader::Long(len))
}

/// Read a string or byte sequence stored at `slot`.
pub fn read_bytes<S, H>(store: &S, hasher: &H, slot: &Slot) -> Result<Vec<u8>>
where
    S: WordStore + ?Sized,
    H: SlotHasher + ?Sized,
{
    let base = store.read_word(slot)?;
    match decode_header(slot, &base)? {
        BytesHeader::Short(len) => Ok(base.0[..len].to_vec()),
        header @ BytesHeader::Long(len) => {
            let data_slot = hasher.hash_slot(slot);
            let mut data = Vec::with_capacity(header.data_words() * 32);
            for i in 0..header.data_words() {
                let word = store.read_word(&data_slot.wrapping_add(U256::from(i)))?;
                data.extend_from_slice(&word.0);
            }
            data.truncate(len);
            Ok(data)
        }
    }
}

/// Store a string or byte sequence at `slot`.
///
/// Continuation words of a previous, longer value that the new value no
/// longer covers are zeroed.
pub fn write_bytes<S, H>(store: &S, hasher: &H, slot: &Slot, data: &[u8]) -> Result<()>
where
    S: WordStore + ?Sized,
    H: SlotHasher + ?Sized,
{
    let stale_words = previous_data_words(store, slot)?;
    let data_slot = hasher.hash_slot(slot);

    let new_words = if data.len() <= MAX_SHORT_LENGTH {
        store.write_word(slot, encode_short(data)?)?;
        0
    } else {
        store.write_word(slot, encode_long_header(data.len()))?;
        for (i, chunk) in data.chunks(32).enumerate() {
            let mut word = [0u8; 32];
            word[..chunk.len()].copy_from_slice(chunk);
            store.write_word(&data_slot.wrapping_add(U256::from(i)), Word(word))?;
        }
        data.len().div_ceil(32)
    };

    for i in new_words..stale_words {
        store.write_word(&data_slot.wrapping_add(U256::from(i)), Word::ZERO)?;
    }
    Ok(())
}

/// Zero a string or byte sequence, including its continuation words.
pub fn clear_bytes<S, H>(store: &S, hasher: &H, slot: &Slot) -> Result<()>
where
    S: WordStore + ?Sized,
    H: SlotHasher + ?Sized,
{
    let stale_words = previous_data_words(store, slot)?;
    let data_slot = hasher.hash_slot(slot);
    for i in 0..stale_words {
        store.write_word(&data_slot.wrapping_add(U256::from(i)), Word::ZERO)?;
    }
    store.write_word(slot, Word::ZERO)?;
    Ok(())
}

fn previous_data_words<S: WordStore + ?Sized>(store: &S, slot: &Slot) -> Result<usize> {
    let previous = store.read_word(slot)?;
    match decode_header(slot, &previous) {
        Ok(header) => Ok(header.data_words()),
        Err(err) => {
            warn!(%slot, %err, "overwriting undecodable string header");
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotscope_core::Keccak256;
    use slotscope_storage::MemoryStore;

    #[test]
    fn test_scalar_ranges_fill_from_low_order_end() {
        let word = Word::ZERO;
        let word = write_scalar(&word, 0, 4, &[0, 0, 0, 3]).unwrap();
        let word = write_scalar(&word, 4, 4, &[0, 0, 0, 4]).unwrap();

        assert_eq!(word.0[31], 3);
        assert_eq!(word.0[27], 4);
        assert_eq!(read_scalar(&word, 0, 4).unwrap(), vec![0, 0, 0, 3]);
        assert_eq!(read_scalar(&word, 4, 4).unwrap(), vec![0, 0, 0, 4]);
    }

    #[test]
    fn test_write_scalar_preserves_neighbors() {
        let word = Word([0xff; 32]);
        let word = write_scalar(&word, 8, 2, &[0x12, 0x34]).unwrap();
        assert_eq!(read_scalar(&word, 8, 2).unwrap(), vec![0x12, 0x34]);
        assert_eq!(read_scalar(&word, 0, 8).unwrap(), vec![0xff; 8]);
        assert_eq!(read_scalar(&word, 10, 22).unwrap(), vec![0xff; 22]);
    }

    #[test]
    fn test_byte_range_rejects_out_of_word() {
        assert!(matches!(
            read_scalar(&Word::ZERO, 30, 4),
            Err(LayoutError::ByteRange { .. })
        ));
        assert!(matches!(
            read_scalar(&Word::ZERO, 0, 0),
            Err(LayoutError::ByteRange { .. })
        ));
    }

    #[test]
    fn test_uint_overflow() {
        let result = encode_scalar(ScalarKind::Uint, 1, &Value::uint(256));
        assert!(matches!(result, Err(LayoutError::EncodingOverflow { width: 1, .. })));
        let ok = encode_scalar(ScalarKind::Uint, 1, &Value::uint(255)).unwrap();
        assert_eq!(ok, vec![0xff]);
    }

    #[test]
    fn test_overflow_reports_hex_value() {
        let err = write_scalar(&Word::ZERO, 0, 1, &[0x0a, 0xbc]).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::EncodingOverflow { ref value, width: 1 } if value == "0x0abc"
        ));

        let wide = Value::FixedBytes(vec![0xde, 0xad, 0xbe]);
        let err = encode_scalar(ScalarKind::FixedBytes, 2, &wide).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::EncodingOverflow { ref value, width: 2 } if value == "0xdeadbe"
        ));
    }

    #[test]
    fn test_int_two_complement() {
        let bytes = encode_scalar(ScalarKind::Int, 2, &Value::int(-2)).unwrap();
        assert_eq!(bytes, vec![0xff, 0xfe]);
        assert_eq!(decode_scalar(ScalarKind::Int, &bytes), Value::int(-2));

        assert!(encode_scalar(ScalarKind::Int, 1, &Value::int(128)).is_err());
        assert!(encode_scalar(ScalarKind::Int, 1, &Value::int(-129)).is_err());
        assert!(encode_scalar(ScalarKind::Int, 1, &Value::int(-128)).is_ok());
    }

    #[test]
    fn test_kind_mismatch() {
        let result = encode_scalar(ScalarKind::Address, 20, &Value::Bool(true));
        assert!(matches!(result, Err(LayoutError::ValueTypeMismatch { .. })));
    }

    #[test]
    fn test_key_padding() {
        let uint_key = TypeLayout::Scalar {
            kind: ScalarKind::Uint,
            width: 32,
        };
        assert_eq!(encode_key(&uint_key, &Value::uint(2)).unwrap(), pad32(&[2]).to_vec());

        let bytes4 = TypeLayout::Scalar {
            kind: ScalarKind::FixedBytes,
            width: 4,
        };
        let key = encode_key(&bytes4, &Value::FixedBytes(vec![1, 2, 3, 4])).unwrap();
        assert_eq!(&key[..4], &[1, 2, 3, 4]);
        assert_eq!(&key[4..], &[0u8; 28]);

        let int8 = TypeLayout::Scalar {
            kind: ScalarKind::Int,
            width: 1,
        };
        assert_eq!(encode_key(&int8, &Value::int(-1)).unwrap(), vec![0xff; 32]);

        assert_eq!(
            encode_key(&TypeLayout::String, &Value::from("abc")).unwrap(),
            b"abc".to_vec()
        );
    }

    #[test]
    fn test_short_string_boundary() {
        let data = vec![b'a'; 31];
        let word = encode_short(&data).unwrap();
        assert_eq!(word.low_byte(), 62);
        assert_eq!(
            decode_header(&U256::ZERO, &word).unwrap(),
            BytesHeader::Short(31)
        );
        assert!(encode_short(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_long_string_boundary() {
        let store = MemoryStore::new();
        let slot = U256::from(3);
        let data = vec![b'b'; 32];
        write_bytes(&store, &Keccak256, &slot, &data).unwrap();

        assert_eq!(store.read_word(&slot).unwrap().to_u256(), U256::from(65));
        // Base word plus exactly one continuation word
        assert_eq!(store.len(), 2);
        let continuation = store.read_word(&Keccak256.hash_slot(&slot)).unwrap();
        assert_eq!(continuation.0, [b'b'; 32]);

        assert_eq!(read_bytes(&store, &Keccak256, &slot).unwrap(), data);
    }

    #[test]
    fn test_long_value_zero_pads_final_word() {
        let store = MemoryStore::new();
        let slot = U256::ZERO;
        let data: Vec<u8> = (0..40).collect();
        write_bytes(&store, &Keccak256, &slot, &data).unwrap();

        let last = store
            .read_word(&Keccak256.hash_slot(&slot).wrapping_add(U256::from(1)))
            .unwrap();
        assert_eq!(&last.0[..8], &data[32..]);
        assert_eq!(&last.0[8..], &[0u8; 24]);
        assert_eq!(read_bytes(&store, &Keccak256, &slot).unwrap(), data);
    }

    #[test]
    fn test_shrinking_clears_stale_words() {
        let store = MemoryStore::new();
        let slot = U256::from(1);
        write_bytes(&store, &Keccak256, &slot, &[7u8; 100]).unwrap();
        assert_eq!(store.len(), 5);

        write_bytes(&store, &Keccak256, &slot, &[8u8; 40]).unwrap();
        assert_eq!(store.len(), 3);

        write_bytes(&store, &Keccak256, &slot, b"short").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(read_bytes(&store, &Keccak256, &slot).unwrap(), b"short");

        clear_bytes(&store, &Keccak256, &slot).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_headers_rejected() {
        // Even discriminant with a length above 31
        let mut word = [0u8; 32];
        word[31] = 64;
        assert!(matches!(
            decode_header(&U256::ZERO, &Word(word)),
            Err(LayoutError::CorruptEncoding { .. })
        ));

        // Odd discriminant claiming a short length
        let word = Word::from_u256(U256::from(2 * 5 + 1));
        assert!(matches!(
            decode_header(&U256::ZERO, &word),
            Err(LayoutError::CorruptEncoding { .. })
        ));
    }

    #[test]
    fn test_empty_value_is_zero_word() {
        assert_eq!(encode_short(&[]).unwrap(), Word::ZERO);
        assert_eq!(
            decode_header(&U256::ZERO, &Word::ZERO).unwrap(),
            BytesHeader::Short(0)
        );
    }
}
