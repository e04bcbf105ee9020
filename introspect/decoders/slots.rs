use std::convert::TryFrom;

use crate::decoders::{index_name, FieldDecoder, FieldIter, FieldValue};
use crate::error::{DecodeErrorKind, Result};
use crate::header::ObjectHeader;
use crate::object::ObjectRef;
use crate::tagged::Tagged;

/// Slots-bearing objects (`Array.Slots`, `Tuple`)
///
/// ```text
/// +-----------+
/// |  <Int:N>  | SLOTS[0]    total number of slots, including this one
/// |-----------|
/// |  field-1  | SLOTS[1]
/// |    ...    |
/// |field-(N-1)| SLOTS[N-1]
/// +-----------+
/// ```
pub struct SlotsDecoder;

impl SlotsDecoder {
    /// Converts a stored slot count to the number of usable slots
    fn usable_length(object: &ObjectRef<'_>, stored_count: u64) -> Result<usize> {
        let count = object.expect_smallint(stored_count)?;
        if count < 1 {
            return Err(object.decode_error(DecodeErrorKind::InvalidSlotCount(count)));
        }

        let length = (count - 1) as u64;
        let slots_size = length
            .checked_mul(object.word_size() as u64)
            .ok_or_else(|| object.decode_error(DecodeErrorKind::ImplausibleSize(length)))?;
        object.check_payload_size(slots_size)?;

        usize::try_from(length)
            .map_err(|_| object.decode_error(DecodeErrorKind::ImplausibleSize(length)))
    }

    /// Reads the number of usable slots
    pub(crate) fn read_length(object: &ObjectRef<'_>) -> Result<usize> {
        let stored_count = object.read_word(object.body_offset())?;
        Self::usable_length(object, stored_count)
    }

    /// Returns an iterator over `length` slots starting after the count slot
    pub(crate) fn slot_fields<'t>(storage: ObjectRef<'t>, length: usize) -> FieldIter<'t> {
        Box::new((0..length).map(move |index| {
            let value = storage
                .read_word(storage.body_word_offset(index + 1))
                .map(|word| FieldValue::Value(Tagged::classify(word, storage.width())));

            (index_name(index), value)
        }))
    }
}

impl FieldDecoder for SlotsDecoder {
    fn value_repr(&self, object: &ObjectRef<'_>) -> Result<Option<String>> {
        Ok(Some(format!("[{}]", Self::read_length(object)?)))
    }

    fn fields<'t>(&self, object: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
        let length = Self::read_length(object)?;
        Ok(Self::slot_fields(*object, length))
    }
}

/// `Array`: a reference to an `Array.Slots` storage object followed by the array length
///
/// The storage may have more slots than the array uses.
pub struct ArrayDecoder;

impl ArrayDecoder {
    fn read_length(object: &ObjectRef<'_>) -> Result<u64> {
        object.read_word(object.body_word_offset(1))
    }

    /// Reads the storage object's header and slot count with a single read
    fn read_storage<'t>(object: &ObjectRef<'t>) -> Result<(ObjectRef<'t>, usize)> {
        let words = object.read_words(object.body_offset(), 2)?;
        let (data_word, length) = (words[0], words[1]);

        let storage_address = match Tagged::classify(data_word, object.width()) {
            Tagged::Reference(address) => address,
            _ => return Err(object.decode_error(DecodeErrorKind::NotReference(data_word))),
        };

        let memory = object.memory();
        let storage_words = memory.read_words(storage_address, 3)?;
        let storage = ObjectRef::new(
            memory,
            storage_address,
            ObjectHeader::from_words(storage_words[0], storage_words[1]),
        );

        let capacity = SlotsDecoder::usable_length(&storage, storage_words[2])?;
        if length > capacity as u64 {
            return Err(object.decode_error(DecodeErrorKind::LengthExceedsStorage {
                length,
                capacity: capacity as u64,
            }));
        }

        Ok((storage, length as usize))
    }
}

impl FieldDecoder for ArrayDecoder {
    fn value_repr(&self, object: &ObjectRef<'_>) -> Result<Option<String>> {
        Ok(Some(format!("[{}]", Self::read_length(object)?)))
    }

    fn fields<'t>(&self, object: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
        let (storage, length) = Self::read_storage(object)?;
        Ok(SlotsDecoder::slot_fields(storage, length))
    }
}
