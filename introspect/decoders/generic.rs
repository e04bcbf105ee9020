use crate::decoders::descriptor::{Extent, TypeLayout};
use crate::decoders::{FieldDecoder, FieldIter, FieldValue};
use crate::error::{DecodeErrorKind, Result};
use crate::object::ObjectRef;
use crate::tagged::Tagged;

/// Fallback for types without a dedicated decoder
///
/// The layout comes from the object's own type descriptor. Every slot is shown as a raw tagged
/// value, including the count slot of extendable objects, followed by the uninterpreted bytes.
pub struct GenericDecoder;

/// Located `BYTES` part
struct BytesPart {
    offset: usize,
    size: usize,
}

impl GenericDecoder {
    fn slot_name(index: usize) -> String {
        format!("slot[{}]", index)
    }

    fn read_slot_count(object: &ObjectRef<'_>, slots: Extent) -> Result<usize> {
        let count = match slots {
            Extent::Fixed(count) => count,
            Extent::Extendable => {
                let stored_count = object.read_word(object.body_offset())?;
                let count = object.expect_smallint(stored_count)?;
                if count < 1 {
                    return Err(object.decode_error(DecodeErrorKind::InvalidSlotCount(count)));
                }
                count as u64
            }
        };

        let slots_size = count
            .checked_mul(object.word_size() as u64)
            .ok_or_else(|| object.decode_error(DecodeErrorKind::ImplausibleSize(count)))?;
        object.check_payload_size(slots_size)?;

        Ok(count as usize)
    }

    fn locate_bytes(object: &ObjectRef<'_>, bytes: Extent, slot_count: usize) -> Result<BytesPart> {
        let offset = object.body_word_offset(slot_count);

        match bytes {
            Extent::Fixed(size) => Ok(BytesPart {
                offset,
                size: object.check_payload_size(size)?,
            }),
            Extent::Extendable => {
                let total_size = object.read_word(offset)?;
                let word_size = object.word_size() as u64;

                let data_size = total_size.checked_sub(word_size).ok_or_else(|| {
                    object.decode_error(DecodeErrorKind::ImplausibleSize(total_size))
                })?;

                Ok(BytesPart {
                    offset: offset + object.word_size(),
                    size: object.check_payload_size(data_size)?,
                })
            }
        }
    }
}

impl FieldDecoder for GenericDecoder {
    fn fields<'t>(&self, object: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
        let layout = TypeLayout::read(object.memory(), object.header().type_addr())?;
        let slot_count = Self::read_slot_count(object, layout.slots)?;
        let bytes_part = Self::locate_bytes(object, layout.bytes, slot_count)?;

        let object = *object;
        let slots = (0..slot_count).map(move |index| {
            let value = object
                .read_word(object.body_word_offset(index))
                .map(|word| FieldValue::Value(Tagged::classify(word, object.width())));

            (Self::slot_name(index), value)
        });

        let bytes = Some(bytes_part)
            .filter(|part| part.size > 0)
            .into_iter()
            .map(move |part| {
                let data = object
                    .read_bytes(part.offset, part.size)
                    .map(FieldValue::Bytes);

                ("bytes".to_owned(), data)
            });

        Ok(Box::new(slots.chain(bytes)))
    }
}
