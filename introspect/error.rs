use std::fmt;
use std::result;

use thiserror::Error;

/// Target memory could not be read
///
/// This is produced by the host's memory reader and passed through the introspector verbatim.
/// It is never retried; the target may be paused mid-mutation and a second read could observe a
/// different state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot read {size} bytes at {address:#x}: {reason}")]
pub struct MemoryAccessError {
    pub address: u64,
    pub size: usize,
    pub reason: String,
}

impl MemoryAccessError {
    pub fn new(address: u64, size: usize, reason: impl Into<String>) -> MemoryAccessError {
        MemoryAccessError {
            address,
            size,
            reason: reason.into(),
        }
    }
}

/// Structurally inconsistent object payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot decode object at {address:#x}: {}", .kind.message())]
pub struct DecodeError {
    address: u64,
    kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(address: u64, kind: DecodeErrorKind) -> DecodeError {
        DecodeError { address, kind }
    }

    /// Address of the object being decoded
    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }
}

/// Decode error without the address of the offending object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Stored slot count is below 1
    InvalidSlotCount(i64),
    /// A word expected to hold a small integer has its tag bit clear
    NotSmallInt(u64),
    /// A word expected to reference a heap object is null or a small integer
    NotReference(u64),
    InvalidUtf8,
    InvalidCodePoint(u32),
    /// Array length is larger than its storage object
    LengthExceedsStorage { length: u64, capacity: u64 },
    /// Declared element data does not fit in the stored byte size
    LengthExceedsExtent { data_size: u64, extent: u64 },
    ImplausibleSize(u64),
    /// Word with bit 1 set and bit 0 clear
    MisalignedReference,
}

impl DecodeErrorKind {
    /// Returns a string describing the error
    pub fn message(&self) -> String {
        match self {
            DecodeErrorKind::InvalidSlotCount(count) => {
                format!("stored slot count {} is less than 1", count)
            }
            DecodeErrorKind::NotSmallInt(word) => {
                format!("expected a small integer, found {:#x}", word)
            }
            DecodeErrorKind::NotReference(word) => {
                format!("expected an object reference, found {:#x}", word)
            }
            DecodeErrorKind::InvalidUtf8 => "text is not valid UTF-8".to_owned(),
            DecodeErrorKind::InvalidCodePoint(code) => {
                format!("{:#x} is not a Unicode scalar value", code)
            }
            DecodeErrorKind::LengthExceedsStorage { length, capacity } => format!(
                "length {} exceeds storage capacity {}",
                length, capacity
            ),
            DecodeErrorKind::LengthExceedsExtent { data_size, extent } => format!(
                "{} bytes of data do not fit in a {} byte extent",
                data_size, extent
            ),
            DecodeErrorKind::ImplausibleSize(size) => format!("implausible size {}", size),
            DecodeErrorKind::MisalignedReference => "reference is not word aligned".to_owned(),
        }
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Invalid decoder registry setup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("a decoder is already registered for type `{0}`")]
    DuplicateDecoder(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    MemoryAccess(#[from] MemoryAccessError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl Error {
    pub fn is_memory_access(&self) -> bool {
        matches!(self, Error::MemoryAccess(_))
    }

    /// Returns the decode error kind if this is a decode error
    pub fn decode_kind(&self) -> Option<&DecodeErrorKind> {
        match self {
            Error::Decode(decode_err) => Some(decode_err.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn messages() {
        let err: Error = DecodeError::new(0x1000, DecodeErrorKind::InvalidSlotCount(0)).into();
        assert_eq!(
            "cannot decode object at 0x1000: stored slot count 0 is less than 1",
            err.to_string()
        );

        let err: Error = MemoryAccessError::new(0x10, 16, "bad address").into();
        assert!(err.is_memory_access());
        assert_eq!("cannot read 16 bytes at 0x10: bad address", err.to_string());

        let err: Error = ConfigurationError::DuplicateDecoder("bool".to_owned()).into();
        assert_eq!(
            "a decoder is already registered for type `bool`",
            err.to_string()
        );
    }
}
