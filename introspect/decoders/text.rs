//! Inline-buffer objects
//!
//! These carry their payload directly after a few fixed words. The payload extent is found one
//! of two ways, and each type uses exactly one of them:
//!
//! - `Symbol` stores the total byte size of its `BYTES` part. The data extent is that size minus
//!   the fixed words in front of the data, and the text ends at the first NUL byte in it.
//! - `String` and `Bytes` store an explicit length. The data is exactly that long; the stored byte
//!   size only bounds it.

use crate::decoders::{chain_fields, FieldDecoder, FieldIter, FieldValue};
use crate::error::{DecodeErrorKind, Result};
use crate::escape::{escape_bytes, quote_str};
use crate::object::ObjectRef;
use crate::tagged::Tagged;

fn decode_utf8(object: &ObjectRef<'_>, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| object.decode_error(DecodeErrorKind::InvalidUtf8))
}

/// Returns the size of the data that follows `fixed_words` words in a `BYTES` part
fn data_extent(object: &ObjectRef<'_>, bytes_size: u64, fixed_words: usize) -> Result<u64> {
    let fixed_size = (fixed_words * object.word_size()) as u64;
    bytes_size
        .checked_sub(fixed_size)
        .ok_or_else(|| object.decode_error(DecodeErrorKind::ImplausibleSize(bytes_size)))
}

/// Fails if `data_size` bytes do not fit in the data extent
fn check_fits_extent(object: &ObjectRef<'_>, data_size: u64, extent: u64) -> Result<()> {
    if data_size > extent {
        return Err(object.decode_error(DecodeErrorKind::LengthExceedsExtent { data_size, extent }));
    }

    Ok(())
}

/// `Symbol`: `bytes_size`, registry link, hash, then NUL padded UTF-8 data
pub struct SymbolDecoder;

impl SymbolDecoder {
    const FIXED_WORDS: usize = 3;

    fn data_offset(object: &ObjectRef<'_>) -> usize {
        object.body_word_offset(Self::FIXED_WORDS)
    }

    fn read_text(object: &ObjectRef<'_>, bytes_size: u64) -> Result<String> {
        let extent = data_extent(object, bytes_size, Self::FIXED_WORDS)?;
        let extent = object.check_payload_size(extent)?;

        let mut data = object.read_bytes(Self::data_offset(object), extent)?;
        if let Some(nul_index) = data.iter().position(|byte| *byte == 0) {
            data.truncate(nul_index);
        }

        decode_utf8(object, data)
    }
}

impl FieldDecoder for SymbolDecoder {
    fn value_repr(&self, object: &ObjectRef<'_>) -> Result<Option<String>> {
        let bytes_size = object.read_word(object.body_offset())?;
        Ok(Some(quote_str(&Self::read_text(object, bytes_size)?)))
    }

    fn fields<'t>(&self, object: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
        let words = object.read_words(object.body_offset(), Self::FIXED_WORDS)?;
        let (bytes_size, registry_next, hash) = (words[0], words[1], words[2]);

        let object = *object;
        let text = std::iter::once_with(move || {
            let text = Self::read_text(&object, bytes_size).map(FieldValue::Text);
            ("text".to_owned(), text)
        });

        Ok(chain_fields(
            vec![
                ("hash", FieldValue::Unsigned(hash)),
                (
                    "registry_next",
                    FieldValue::Value(Tagged::classify(registry_next, object.width())),
                ),
            ],
            Box::new(text),
        ))
    }
}

/// Packed string length
///
/// Bits `[1:0]` hold the element size minus one and the remaining bits hold the element count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAndLength {
    pub element_size: usize,
    pub count: u64,
}

impl TypeAndLength {
    pub fn unpack(word: u64) -> TypeAndLength {
        TypeAndLength {
            element_size: (word & 0b11) as usize + 1,
            count: word >> 2,
        }
    }

    /// Size of the element data in bytes
    ///
    /// The count has two bits less than a word and elements are at most four bytes, so this
    /// cannot overflow.
    pub fn data_size(self) -> u64 {
        self.count * self.element_size as u64
    }
}

/// `String`: `bytes_size`, packed type-and-length, then `count` elements
///
/// Single byte elements are UTF-8. Wider elements each hold one Unicode scalar value.
pub struct StringDecoder;

impl StringDecoder {
    const FIXED_WORDS: usize = 2;

    /// Reads the packed length and checks it against the stored byte size
    fn read_layout(object: &ObjectRef<'_>) -> Result<(TypeAndLength, usize)> {
        let words = object.read_words(object.body_offset(), Self::FIXED_WORDS)?;
        let (bytes_size, packed) = (words[0], TypeAndLength::unpack(words[1]));

        let data_size = packed.data_size();
        let extent = data_extent(object, bytes_size, Self::FIXED_WORDS)?;
        check_fits_extent(object, data_size, extent)?;

        Ok((packed, object.check_payload_size(data_size)?))
    }

    fn read_text(object: &ObjectRef<'_>, packed: TypeAndLength, data_size: usize) -> Result<String> {
        let data = object.read_bytes(object.body_word_offset(Self::FIXED_WORDS), data_size)?;

        if packed.element_size == 1 {
            return decode_utf8(object, data);
        }

        let memory = object.memory();
        data.chunks_exact(packed.element_size)
            .map(|element| {
                let code = memory.decode_uint(element) as u32;
                std::char::from_u32(code)
                    .ok_or_else(|| object.decode_error(DecodeErrorKind::InvalidCodePoint(code)))
            })
            .collect()
    }
}

impl FieldDecoder for StringDecoder {
    fn value_repr(&self, object: &ObjectRef<'_>) -> Result<Option<String>> {
        let (packed, data_size) = Self::read_layout(object)?;
        Ok(Some(quote_str(&Self::read_text(object, packed, data_size)?)))
    }

    fn fields<'t>(&self, object: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
        let (packed, data_size) = Self::read_layout(object)?;

        let object = *object;
        let text = std::iter::once_with(move || {
            let text = Self::read_text(&object, packed, data_size).map(FieldValue::Text);
            ("text".to_owned(), text)
        });

        Ok(chain_fields(
            vec![
                ("length", FieldValue::Unsigned(packed.count)),
                (
                    "element_size",
                    FieldValue::Unsigned(packed.element_size as u64),
                ),
            ],
            Box::new(text),
        ))
    }
}

/// `Bytes`: `bytes_size`, data size, then raw data
pub struct BytesDecoder;

impl BytesDecoder {
    const FIXED_WORDS: usize = 2;

    fn read_layout(object: &ObjectRef<'_>) -> Result<(u64, usize)> {
        let words = object.read_words(object.body_offset(), Self::FIXED_WORDS)?;
        let (bytes_size, size) = (words[0], words[1]);

        let extent = data_extent(object, bytes_size, Self::FIXED_WORDS)?;
        check_fits_extent(object, size, extent)?;

        Ok((size, object.check_payload_size(size)?))
    }

    fn read_data(object: &ObjectRef<'_>, size: usize) -> Result<Vec<u8>> {
        object.read_bytes(object.body_word_offset(Self::FIXED_WORDS), size)
    }
}

impl FieldDecoder for BytesDecoder {
    fn value_repr(&self, object: &ObjectRef<'_>) -> Result<Option<String>> {
        let (_, size) = Self::read_layout(object)?;
        let data = Self::read_data(object, size)?;

        Ok(Some(format!("b\"{}\"", escape_bytes(&data))))
    }

    fn fields<'t>(&self, object: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
        let (stored_size, size) = Self::read_layout(object)?;

        let object = *object;
        let data = std::iter::once_with(move || {
            let data = Self::read_data(&object, size).map(FieldValue::Bytes);
            ("data".to_owned(), data)
        });

        Ok(chain_fields(
            vec![("size", FieldValue::Unsigned(stored_size))],
            Box::new(data),
        ))
    }
}
