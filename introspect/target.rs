//! Capabilities the introspector consumes from its host
//!
//! The host owns the target process (or an image of its memory) and its symbol table. The
//! introspector never searches ambient state; everything it knows about the target comes through
//! a [`Target`] passed in explicitly.

use crate::error::{MemoryAccessError, Result};

/// Machine word width of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    W32,
    W64,
}

impl Width {
    /// Returns the width matching the pointer width of the current process
    pub fn native() -> Width {
        if cfg!(target_pointer_width = "64") {
            Width::W64
        } else {
            Width::W32
        }
    }

    pub fn from_bits(bits: u32) -> Option<Width> {
        match bits {
            32 => Some(Width::W32),
            64 => Some(Width::W64),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Width::W32 => 32,
            Width::W64 => 64,
        }
    }

    /// Size of a word in bytes
    pub fn bytes(self) -> usize {
        match self {
            Width::W32 => 4,
            Width::W64 => 8,
        }
    }

    /// Mask selecting the bits of a word
    pub fn mask(self) -> u64 {
        match self {
            Width::W32 => u64::from(u32::MAX),
            Width::W64 => u64::MAX,
        }
    }

    /// Reinterprets a word as the target's signed `size_t`-width integer
    pub fn to_signed(self, word: u64) -> i64 {
        match self {
            Width::W32 => i64::from(word as u32 as i32),
            Width::W64 => word as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Host-provided access to a target process
pub trait Target {
    /// Reads `size` bytes starting at `address`
    ///
    /// Unreadable or unmapped ranges fail; partial reads must not be returned.
    fn read_memory(
        &self,
        address: u64,
        size: usize,
    ) -> std::result::Result<Vec<u8>, MemoryAccessError>;

    /// Resolves the address of a type descriptor to its registry name
    fn resolve_type_name(&self, address: u64) -> Option<String>;

    fn architecture_width(&self) -> Width;

    fn byte_order(&self) -> ByteOrder {
        ByteOrder::Little
    }
}

impl<'a, T: Target + ?Sized> Target for &'a T {
    fn read_memory(
        &self,
        address: u64,
        size: usize,
    ) -> std::result::Result<Vec<u8>, MemoryAccessError> {
        (**self).read_memory(address, size)
    }

    fn resolve_type_name(&self, address: u64) -> Option<String> {
        (**self).resolve_type_name(address)
    }

    fn architecture_width(&self) -> Width {
        (**self).architecture_width()
    }

    fn byte_order(&self) -> ByteOrder {
        (**self).byte_order()
    }
}

/// Typed reads on top of a [`Target`]
///
/// The width and byte order are queried once when the view is created. Every method performs
/// exactly one `read_memory` call.
#[derive(Clone, Copy)]
pub struct Memory<'t> {
    target: &'t dyn Target,
    width: Width,
    byte_order: ByteOrder,
}

impl<'t> Memory<'t> {
    pub fn new(target: &'t dyn Target) -> Memory<'t> {
        Memory {
            target,
            width: target.architecture_width(),
            byte_order: target.byte_order(),
        }
    }

    pub fn target(&self) -> &'t dyn Target {
        self.target
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn word_size(&self) -> usize {
        self.width.bytes()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Returns `base + offset`, failing if `size` bytes there would run past the address space
    pub fn offset_address(&self, base: u64, offset: u64, size: usize) -> Result<u64> {
        base.checked_add(offset)
            .filter(|address| address.checked_add(size as u64).is_some())
            .ok_or_else(|| {
                MemoryAccessError::new(
                    base,
                    size,
                    format!("offset {:#x} wraps around the address space", offset),
                )
                .into()
            })
    }

    pub fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        tracing::trace!(address, size, "read_memory");

        if address.checked_add(size as u64).is_none() {
            return Err(
                MemoryAccessError::new(address, size, "range wraps around the address space")
                    .into(),
            );
        }

        let bytes = self.target.read_memory(address, size)?;
        if bytes.len() != size {
            return Err(MemoryAccessError::new(
                address,
                size,
                format!("short read of {} bytes", bytes.len()),
            )
            .into());
        }

        Ok(bytes)
    }

    pub fn read_word(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, self.word_size())?;
        Ok(self.decode_uint(&bytes))
    }

    /// Reads `count` consecutive words with a single read
    pub fn read_words(&self, address: u64, count: usize) -> Result<Vec<u64>> {
        let word_size = self.word_size();
        let bytes = self.read_bytes(address, word_size * count)?;

        Ok(bytes
            .chunks_exact(word_size)
            .map(|chunk| self.decode_uint(chunk))
            .collect())
    }

    /// Decodes an unsigned integer of 1 to 8 bytes in the target's byte order
    pub fn decode_uint(&self, bytes: &[u8]) -> u64 {
        debug_assert!(bytes.len() <= 8);

        let mut padded = [0u8; 8];
        match self.byte_order {
            ByteOrder::Little => {
                padded[..bytes.len()].copy_from_slice(bytes);
                u64::from_le_bytes(padded)
            }
            ByteOrder::Big => {
                padded[8 - bytes.len()..].copy_from_slice(bytes);
                u64::from_be_bytes(padded)
            }
        }
    }

    /// Reads an IEEE-754 binary64 value
    pub fn read_f64(&self, address: u64) -> Result<f64> {
        let bytes = self.read_bytes(address, 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes);

        Ok(match self.byte_order {
            ByteOrder::Little => f64::from_le_bytes(raw),
            ByteOrder::Big => f64::from_be_bytes(raw),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Fixed(Vec<u8>, ByteOrder);

    impl Target for Fixed {
        fn read_memory(
            &self,
            address: u64,
            size: usize,
        ) -> std::result::Result<Vec<u8>, MemoryAccessError> {
            let start = address as usize;
            self.0
                .get(start..start + size)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| MemoryAccessError::new(address, size, "out of range"))
        }

        fn resolve_type_name(&self, _: u64) -> Option<String> {
            None
        }

        fn architecture_width(&self) -> Width {
            Width::W32
        }

        fn byte_order(&self) -> ByteOrder {
            self.1
        }
    }

    #[test]
    fn widths() {
        assert_eq!(Some(Width::W32), Width::from_bits(32));
        assert_eq!(None, Width::from_bits(16));
        assert_eq!(0xffff_ffff, Width::W32.mask());
        assert_eq!(-1, Width::W32.to_signed(0xffff_ffff));
        assert_eq!(-1, Width::W64.to_signed(u64::MAX));
    }

    #[test]
    fn read_words_in_byte_order() {
        let bytes = vec![1, 0, 0, 0, 0, 0, 0, 2];

        let little = Fixed(bytes.clone(), ByteOrder::Little);
        let memory = Memory::new(&little);
        assert_eq!(vec![1, 0x0200_0000], memory.read_words(0, 2).unwrap());

        let big = Fixed(bytes, ByteOrder::Big);
        let memory = Memory::new(&big);
        assert_eq!(vec![0x0100_0000, 2], memory.read_words(0, 2).unwrap());
    }

    #[test]
    fn read_f64_in_byte_order() {
        let little = Fixed((-2.5f64).to_le_bytes().to_vec(), ByteOrder::Little);
        assert_eq!(-2.5, Memory::new(&little).read_f64(0).unwrap());

        let big = Fixed((-2.5f64).to_be_bytes().to_vec(), ByteOrder::Big);
        assert_eq!(-2.5, Memory::new(&big).read_f64(0).unwrap());
    }

    #[test]
    fn wrapping_ranges() {
        let target = Fixed(vec![0; 4], ByteOrder::Little);
        let memory = Memory::new(&target);

        assert_eq!(0x1010, memory.offset_address(0x1000, 0x10, 8).unwrap());
        assert!(memory
            .offset_address(u64::MAX - 3, 8, 4)
            .unwrap_err()
            .is_memory_access());
        assert!(memory
            .offset_address(u64::MAX - 7, 0, 16)
            .unwrap_err()
            .is_memory_access());
        assert!(memory.read_word(u64::MAX - 1).unwrap_err().is_memory_access());
    }

    #[test]
    fn unreadable() {
        let target = Fixed(vec![0; 4], ByteOrder::Little);
        let memory = Memory::new(&target);

        assert!(memory.read_word(2).unwrap_err().is_memory_access());
    }
}
