//! Description assembly
//!
//! [`Introspector::describe`] is the entry point hosts call. It classifies a word and, for heap
//! references, reads the object header and picks a decoder. Nothing past the header is read
//! until the host asks for the value or the fields.

use std::fmt;

use serde::Serialize;

use crate::decoders::{Field, FieldDecoder, FieldIter, FieldValue};
use crate::error::{ConfigurationError, DecodeError, DecodeErrorKind, Result};
use crate::header::{GcState, ObjectHeader};
use crate::object::ObjectRef;
use crate::registry::DecoderRegistry;
use crate::tagged::Tagged;
use crate::target::{Memory, Target, Width};

/// Describes tagged values in a target
///
/// The introspector owns no state besides its decoder registry. It can be shared between threads
/// whenever its target can.
pub struct Introspector<T: Target> {
    target: T,
    registry: DecoderRegistry,
}

impl<T: Target> Introspector<T> {
    /// Creates an introspector using the built-in decoders
    pub fn new(target: T) -> Introspector<T> {
        Self::with_registry(target, DecoderRegistry::builtin())
    }

    pub fn with_registry(target: T, registry: DecoderRegistry) -> Introspector<T> {
        Introspector { target, registry }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    /// Registers an additional decoder
    pub fn register_decoder(
        &mut self,
        type_name: &str,
        decoder: Box<dyn FieldDecoder>,
    ) -> std::result::Result<(), ConfigurationError> {
        self.registry.register_decoder(type_name, decoder)
    }

    pub fn width(&self) -> Width {
        self.target.architecture_width()
    }

    fn memory(&self) -> Memory<'_> {
        Memory::new(&self.target)
    }

    /// Describes a raw tagged word
    pub fn describe(&self, word: u64) -> Result<Description<'_>> {
        let memory = self.memory();
        self.describe_classified(memory, Tagged::classify(word, memory.width()))
    }

    /// Describes an already classified value
    pub fn describe_tagged(&self, tagged: Tagged) -> Result<Description<'_>> {
        self.describe_classified(self.memory(), tagged)
    }

    fn describe_classified<'i>(
        &'i self,
        memory: Memory<'i>,
        tagged: Tagged,
    ) -> Result<Description<'i>> {
        let _span = tracing::debug_span!("describe", value = %tagged).entered();

        let address = match tagged {
            Tagged::Null => return Ok(Description::Null),
            Tagged::SmallInt(value) => return Ok(Description::SmallInt(value)),
            Tagged::Reference(address) => address,
        };

        if address & 0b10 != 0 {
            return Err(DecodeError::new(address, DecodeErrorKind::MisalignedReference).into());
        }

        let header = ObjectHeader::read(&memory, address)?;
        let type_addr = header.type_addr();
        let type_name = match self.target.resolve_type_name(type_addr) {
            Some(name) => TypeName::Resolved(name),
            None => TypeName::Opaque(type_addr),
        };

        let decoder = self.registry.lookup(type_name.resolved());

        Ok(Description::Object(ObjectDescription {
            object: ObjectRef::new(memory, address, header),
            type_name,
            decoder,
        }))
    }
}

/// Name of an object's type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName {
    /// Name as reported by the host
    Resolved(String),
    /// Type descriptor address the host could not name
    Opaque(u64),
}

impl TypeName {
    pub fn resolved(&self) -> Option<&str> {
        match self {
            TypeName::Resolved(name) => Some(name),
            TypeName::Opaque(_) => None,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Resolved(name) => formatter.write_str(name),
            TypeName::Opaque(address) => write!(formatter, "<{:#x}>", address),
        }
    }
}

/// Description of a tagged value
#[derive(Debug)]
pub enum Description<'i> {
    Null,
    SmallInt(i64),
    Object(ObjectDescription<'i>),
}

impl<'i> Description<'i> {
    pub fn as_object(&self) -> Option<&ObjectDescription<'i>> {
        match self {
            Description::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Materialises the description
    ///
    /// This reads the complete object. Fields that fail to decode are replaced with placeholders.
    pub fn snapshot(&self) -> Snapshot {
        match self {
            Description::Null => Snapshot::Null,
            Description::SmallInt(value) => Snapshot::SmallInt { value: *value },
            Description::Object(object) => Snapshot::Object(object.snapshot()),
        }
    }
}

impl<'i> fmt::Display for Description<'i> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Description::Null => formatter.write_str("null"),
            Description::SmallInt(value) => write!(formatter, "smallint{{{}}}", value),
            Description::Object(object) => fmt::Display::fmt(object, formatter),
        }
    }
}

/// Description of a heap object
///
/// Only the header has been read when this is created.
pub struct ObjectDescription<'i> {
    object: ObjectRef<'i>,
    type_name: TypeName,
    decoder: &'i dyn FieldDecoder,
}

impl<'i> ObjectDescription<'i> {
    pub fn address(&self) -> u64 {
        self.object.address()
    }

    pub fn header(&self) -> &ObjectHeader {
        self.object.header()
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Returns the object's short single-line value, if its type has one
    pub fn value_repr(&self) -> Result<Option<String>> {
        self.decoder.value_repr(&self.object)
    }

    /// Returns the object's fields
    ///
    /// This fails if the payload cannot be located. Once located, fields that fail to decode are
    /// yielded as [`FieldValue::Unavailable`] so their siblings can still be inspected.
    pub fn fields(&self) -> Result<Fields<'i>> {
        Ok(Fields {
            address: self.address(),
            inner: self.decoder.fields(&self.object)?,
        })
    }

    pub fn snapshot(&self) -> ObjectSnapshot {
        let header = self.header();

        let value = self
            .value_repr()
            .unwrap_or_else(|err| Some(FieldValue::Unavailable(err).to_string()));

        let (fields, error) = match self.fields() {
            Ok(fields) => (
                fields
                    .map(|Field { name, value }| FieldSnapshot {
                        name,
                        value: value.to_string(),
                        reference: value.as_tagged().map_or(false, Tagged::is_reference),
                    })
                    .collect(),
                None,
            ),
            Err(err) => (vec![], Some(err.to_string())),
        };

        ObjectSnapshot {
            address: self.address(),
            type_name: self.type_name.to_string(),
            gc: GcSnapshot {
                state: header.gc_state(),
                marked: header.marked(),
            },
            value,
            fields,
            error,
        }
    }
}

impl<'i> fmt::Debug for ObjectDescription<'i> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ObjectDescription")
            .field("address", &self.address())
            .field("type_name", &self.type_name)
            .field("header", self.header())
            .finish()
    }
}

impl<'i> fmt::Display for ObjectDescription<'i> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.header();

        write!(
            formatter,
            "{:#x} zis_object{{ type={}, gc_info={{state={}, marked={}}} }}",
            self.address(),
            self.type_name,
            header.gc_state(),
            header.marked()
        )
    }
}

/// Lazy iterator over an object's fields
pub struct Fields<'i> {
    address: u64,
    inner: FieldIter<'i>,
}

impl<'i> fmt::Debug for Fields<'i> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Fields({:#x})", self.address)
    }
}

impl<'i> Iterator for Fields<'i> {
    type Item = Field;

    fn next(&mut self) -> Option<Field> {
        let (name, value) = self.inner.next()?;

        let value = value.unwrap_or_else(|err| {
            tracing::warn!(
                address = format_args!("{:#x}", self.address),
                field = %name,
                error = %err,
                "field unavailable"
            );
            FieldValue::Unavailable(err)
        });

        Some(Field { name, value })
    }
}

/// Materialised description suitable for serialisation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Snapshot {
    Null,
    #[serde(rename = "smallint")]
    SmallInt { value: i64 },
    Object(ObjectSnapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSnapshot {
    pub address: u64,
    pub type_name: String,
    pub gc: GcSnapshot,
    pub value: Option<String>,
    pub fields: Vec<FieldSnapshot>,
    /// Reason the fields could not be located
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GcSnapshot {
    pub state: GcState,
    pub marked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSnapshot {
    pub name: String,
    pub value: String,
    /// Set if the value references another heap object
    pub reference: bool,
}
