#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

pub mod decoders;
mod describe;
pub mod error;
mod escape;
pub mod header;
pub mod image;
mod object;
pub mod registry;
pub mod tagged;
pub mod target;

pub use crate::decoders::{Field, FieldDecoder, FieldIter, FieldValue};
pub use crate::describe::{
    Description, FieldSnapshot, Fields, GcSnapshot, Introspector, ObjectDescription,
    ObjectSnapshot, Snapshot, TypeName,
};
pub use crate::error::{
    ConfigurationError, DecodeError, DecodeErrorKind, Error, MemoryAccessError, Result,
};
pub use crate::escape::quote_str;
pub use crate::header::{GcState, ObjectHeader};
pub use crate::object::{ObjectRef, MAX_PAYLOAD_SIZE};
pub use crate::registry::{DecoderRegistry, TypeKey};
pub use crate::tagged::Tagged;
pub use crate::target::{ByteOrder, Memory, Target, Width};
