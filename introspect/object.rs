use crate::error::{DecodeError, DecodeErrorKind, Error, Result};
use crate::header::ObjectHeader;
use crate::tagged::{decode_smallint, Tagged};
use crate::target::{Memory, Width};

/// Largest payload a decoder will read in one go
///
/// Larger sizes come from corrupt or foreign objects.
pub const MAX_PAYLOAD_SIZE: u64 = 16 * 1024 * 1024;

/// Heap object being decoded
///
/// This pairs the object's address and decoded header with the memory of its target. Offsets
/// passed to the read methods are relative to the start of the object.
#[derive(Clone, Copy)]
pub struct ObjectRef<'t> {
    address: u64,
    header: ObjectHeader,
    memory: Memory<'t>,
}

impl<'t> ObjectRef<'t> {
    pub fn new(memory: Memory<'t>, address: u64, header: ObjectHeader) -> ObjectRef<'t> {
        ObjectRef {
            address,
            header,
            memory,
        }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }

    pub fn memory(&self) -> Memory<'t> {
        self.memory
    }

    pub fn width(&self) -> Width {
        self.memory.width()
    }

    pub fn word_size(&self) -> usize {
        self.memory.word_size()
    }

    /// Offset of the first byte after the header
    pub fn body_offset(&self) -> usize {
        ObjectHeader::size(self.width())
    }

    /// Offset of the `index`th word after the header
    pub fn body_word_offset(&self, index: usize) -> usize {
        self.body_offset() + index * self.word_size()
    }

    /// Address of `size` bytes at `offset` into the object
    pub fn address_at(&self, offset: usize, size: usize) -> Result<u64> {
        self.memory.offset_address(self.address, offset as u64, size)
    }

    pub fn read_word(&self, offset: usize) -> Result<u64> {
        let address = self.address_at(offset, self.word_size())?;
        self.memory.read_word(address)
    }

    pub fn read_words(&self, offset: usize, count: usize) -> Result<Vec<u64>> {
        let address = self.address_at(offset, count * self.word_size())?;
        self.memory.read_words(address, count)
    }

    pub fn read_bytes(&self, offset: usize, size: usize) -> Result<Vec<u8>> {
        let address = self.address_at(offset, size)?;
        self.memory.read_bytes(address, size)
    }

    /// Builds a decode error for this object
    pub fn decode_error(&self, kind: DecodeErrorKind) -> Error {
        DecodeError::new(self.address, kind).into()
    }

    /// Decodes a word that must hold a small integer
    pub fn expect_smallint(&self, word: u64) -> Result<i64> {
        match Tagged::classify(word, self.width()) {
            Tagged::SmallInt(_) => Ok(decode_smallint(word, self.width())),
            _ => Err(self.decode_error(DecodeErrorKind::NotSmallInt(word))),
        }
    }

    /// Rejects payload sizes that cannot belong to a real object
    pub fn check_payload_size(&self, size: u64) -> Result<usize> {
        if size > MAX_PAYLOAD_SIZE {
            return Err(self.decode_error(DecodeErrorKind::ImplausibleSize(size)));
        }

        Ok(size as usize)
    }
}
