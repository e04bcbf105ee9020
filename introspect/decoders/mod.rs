//! Per-type field decoders
//!
//! Each heap object shape has a decoder that knows where its payload starts and how long it is.
//! Decoders are stateless; all state for a single decode lives in the iterators they return.

mod descriptor;
mod generic;
mod scalar;
mod slots;
mod text;

use std::fmt;

use crate::error::{Error, Result};
use crate::escape::{escape_bytes, quote_str};
use crate::object::ObjectRef;
use crate::tagged::Tagged;

pub use self::descriptor::TypeDecoder;
pub use self::generic::GenericDecoder;
pub use self::scalar::{BoolDecoder, FloatDecoder, NilDecoder};
pub use self::slots::{ArrayDecoder, SlotsDecoder};
pub use self::text::{BytesDecoder, StringDecoder, SymbolDecoder};

/// Value of a single decoded field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Tagged value that can be described further
    Value(Tagged),
    Bool(bool),
    Int(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Placeholder for a field that failed to decode
    Unavailable(Error),
}

impl FieldValue {
    /// Returns the tagged value if this field holds one
    pub fn as_tagged(&self) -> Option<Tagged> {
        match self {
            FieldValue::Value(tagged) => Some(*tagged),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, FieldValue::Unavailable(_))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(tagged) => write!(formatter, "{}", tagged),
            FieldValue::Bool(true) => formatter.write_str("true"),
            FieldValue::Bool(false) => formatter.write_str("false"),
            FieldValue::Int(value) => write!(formatter, "{}", value),
            FieldValue::Unsigned(value) => write!(formatter, "{}", value),
            FieldValue::Float(value) => write!(formatter, "{:?}", value),
            FieldValue::Text(text) => formatter.write_str(&quote_str(text)),
            FieldValue::Bytes(bytes) => write!(formatter, "b\"{}\"", escape_bytes(bytes)),
            FieldValue::Unavailable(err) => write!(formatter, "<decode error: {}>", err),
        }
    }
}

/// Named field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

/// Field as produced by a decoder, before errors are replaced with placeholders
pub type DecodedField = (String, Result<FieldValue>);

/// Lazy sequence of decoded fields
///
/// Each advancement performs at most one memory read.
pub type FieldIter<'t> = Box<dyn Iterator<Item = DecodedField> + 't>;

/// Decoding rule for one heap object shape
pub trait FieldDecoder: Send + Sync {
    /// Returns a short single-line representation of the object's value
    ///
    /// Types without a simple scalar form return `None`.
    fn value_repr(&self, object: &ObjectRef<'_>) -> Result<Option<String>> {
        let _ = object;
        Ok(None)
    }

    /// Returns the object's fields
    ///
    /// This reads whatever is needed to locate the payload and fails if it is inconsistent. The
    /// payload itself is read as the iterator advances.
    fn fields<'t>(&self, object: &ObjectRef<'t>) -> Result<FieldIter<'t>>;
}

/// Returns an iterator over no fields
pub(crate) fn no_fields<'t>() -> FieldIter<'t> {
    Box::new(std::iter::empty())
}

/// Returns an iterator over already decoded fields followed by lazily decoded ones
pub(crate) fn chain_fields<'t>(
    eager: Vec<(&'static str, FieldValue)>,
    lazy: FieldIter<'t>,
) -> FieldIter<'t> {
    Box::new(
        eager
            .into_iter()
            .map(|(name, value)| (name.to_owned(), Ok(value)))
            .chain(lazy),
    )
}

/// Name of the `index`th element of a sequence
pub(crate) fn index_name(index: usize) -> String {
    format!("[{}]", index)
}
