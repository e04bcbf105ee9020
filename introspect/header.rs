//! Heap object header
//!
//! Every heap object starts with two words:
//!
//! ```text
//!      W-1    ...      2     1        0
//!      +----------------+-----------------+
//! [_1] |    TYPE_PTR    |     GC_STATE    |
//!      +----------------+-----------------+
//!      +----------------+--------+--------+
//! [_2] |     GC_PTR     |(unused)| GC_MARK|
//!      +----------------+--------+--------+
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::target::{Memory, Width};

const LOW_BITS: u64 = 0b11;

/// Garbage collector generation of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GcState {
    New,
    Mid,
    Old,
    Big,
}

impl GcState {
    const ALL: [GcState; 4] = [GcState::New, GcState::Mid, GcState::Old, GcState::Big];

    /// Decodes the two low bits of the first header word
    pub fn from_bits(bits: u64) -> GcState {
        GcState::ALL[(bits & LOW_BITS) as usize]
    }

    /// Returns the two bit encoding of the state
    pub fn bits(self) -> u64 {
        self as u64
    }

    pub fn to_str(self) -> &'static str {
        match self {
            GcState::New => "NEW",
            GcState::Mid => "MID",
            GcState::Old => "OLD",
            GcState::Big => "BIG",
        }
    }
}

impl fmt::Display for GcState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.to_str())
    }
}

/// Decoded object header
///
/// This is a read-only view; nothing is ever written back to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeader {
    type_addr: u64,
    gc_state: GcState,
    marked: bool,
    gc_ptr: u64,
}

impl ObjectHeader {
    /// Size of the header in bytes
    pub fn size(width: Width) -> usize {
        2 * width.bytes()
    }

    /// Unpacks the two raw header words
    pub fn from_words(meta_1: u64, meta_2: u64) -> ObjectHeader {
        ObjectHeader {
            type_addr: meta_1 & !LOW_BITS,
            gc_state: GcState::from_bits(meta_1),
            marked: meta_2 & 1 != 0,
            gc_ptr: meta_2 & !LOW_BITS,
        }
    }

    /// Reads and unpacks the header of the object at `address`
    pub fn read(memory: &Memory<'_>, address: u64) -> Result<ObjectHeader> {
        let words = memory.read_words(address, 2)?;
        Ok(ObjectHeader::from_words(words[0], words[1]))
    }

    /// Address of the object's type descriptor
    pub fn type_addr(&self) -> u64 {
        self.type_addr
    }

    pub fn gc_state(&self) -> GcState {
        self.gc_state
    }

    /// Returns if the GC mark bit is set
    pub fn marked(&self) -> bool {
        self.marked
    }

    pub fn gc_ptr(&self) -> u64 {
        self.gc_ptr
    }
}
