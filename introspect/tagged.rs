//! Tagged value classification
//!
//! A tagged value is a machine word. If bit 0 is set the word holds a small integer in its upper
//! bits. Otherwise it is either null or the word-aligned address of a heap object.

use std::fmt;
use std::ops::RangeInclusive;

use crate::target::Width;

/// Classified tagged value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tagged {
    Null,
    SmallInt(i64),
    /// Address of a heap object
    Reference(u64),
}

impl Tagged {
    /// Classifies a raw word for a target of the given width
    ///
    /// Bits above the target width are ignored.
    pub fn classify(word: u64, width: Width) -> Tagged {
        let word = word & width.mask();

        if word == 0 {
            Tagged::Null
        } else if word & 1 == 1 {
            Tagged::SmallInt(decode_smallint(word, width))
        } else {
            Tagged::Reference(word)
        }
    }

    pub fn is_reference(self) -> bool {
        matches!(self, Tagged::Reference(_))
    }
}

impl fmt::Display for Tagged {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tagged::Null => formatter.write_str("null"),
            Tagged::SmallInt(value) => write!(formatter, "smallint{{{}}}", value),
            Tagged::Reference(address) => write!(formatter, "{:#x}", address),
        }
    }
}

/// Decodes the small integer held in a tagged word
///
/// The value is the word shifted right by one. When the sign bit of the word is set the result
/// is `-((2^W - (word & (2^W - 2))) >> 1)`, which yields the two's complement value at width `W`.
pub fn decode_smallint(word: u64, width: Width) -> i64 {
    let bits = width.bits();
    let modulus = 1u128 << bits;
    let raw = u128::from(word) & (modulus - 1);

    if (raw >> (bits - 1)) & 1 == 1 {
        -(((modulus - (raw & (modulus - 2))) >> 1) as i64)
    } else {
        (raw >> 1) as i64
    }
}

/// Range of values representable as a small integer at the given width
pub fn smallint_range(width: Width) -> RangeInclusive<i64> {
    let value_bits = width.bits() - 1;
    let max = (1i64 << (value_bits - 1)) - 1;
    -max - 1..=max
}

/// Encodes a small integer as a tagged word
///
/// Returns `None` if the value does not fit in a word of the given width.
pub fn encode_smallint(value: i64, width: Width) -> Option<u64> {
    if !smallint_range(width).contains(&value) {
        return None;
    }

    Some(((value as u64) << 1 | 1) & width.mask())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn null() {
        assert_eq!(Tagged::Null, Tagged::classify(0, Width::W32));
        assert_eq!(Tagged::Null, Tagged::classify(0, Width::W64));
    }

    #[test]
    fn references() {
        assert_eq!(
            Tagged::Reference(0x1000),
            Tagged::classify(0x1000, Width::W64)
        );
        assert!(Tagged::classify(0x7fff_0010, Width::W32).is_reference());
    }

    #[test]
    fn smallint_values() {
        assert_eq!(Tagged::SmallInt(0), Tagged::classify(1, Width::W64));
        assert_eq!(Tagged::SmallInt(21), Tagged::classify(43, Width::W64));
        assert_eq!(Tagged::SmallInt(-1), Tagged::classify(u64::MAX, Width::W64));
        assert_eq!(Tagged::SmallInt(-1), Tagged::classify(0xffff_ffff, Width::W32));
        assert_eq!(Tagged::SmallInt(-2), Tagged::classify(0xffff_fffd, Width::W32));
    }

    #[test]
    fn smallint_boundaries() {
        assert_eq!(-(1 << 62), decode_smallint(0x8000_0000_0000_0001, Width::W64));
        assert_eq!((1 << 62) - 1, decode_smallint(0x7fff_ffff_ffff_ffff, Width::W64));
        assert_eq!(-(1 << 30), decode_smallint(0x8000_0001, Width::W32));
        assert_eq!((1 << 30) - 1, decode_smallint(0x7fff_ffff, Width::W32));
    }

    #[test]
    fn upper_bits_ignored_for_32bit() {
        assert_eq!(
            Tagged::SmallInt(-1),
            Tagged::classify(0xdead_beef_ffff_ffff, Width::W32)
        );
        assert_eq!(Tagged::Null, Tagged::classify(0x1_0000_0000, Width::W32));
    }

    #[test]
    fn encode_out_of_range() {
        assert_eq!(None, encode_smallint(1 << 30, Width::W32));
        assert_eq!(Some(0x8000_0001), encode_smallint(-(1 << 30), Width::W32));
        assert_eq!(None, encode_smallint(i64::MIN, Width::W64));
    }

    #[test]
    fn fmt_display() {
        assert_eq!("smallint{-3}", Tagged::SmallInt(-3).to_string());
        assert_eq!("null", Tagged::Null.to_string());
        assert_eq!("0x1000", Tagged::Reference(0x1000).to_string());
    }
}
