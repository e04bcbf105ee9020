//! Type dispatch
//!
//! Decoders are keyed on a normalised type name. Hosts report names the way the runtime's
//! globals spell them (`type_Array_Slots`) or the way its debugger tooling prints them
//! (`builtin/Array_Slots`); both select the same decoder.

use std::collections::HashMap;
use std::fmt;

use crate::decoders::*;
use crate::error::ConfigurationError;

/// Normalised type name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(String);

impl TypeKey {
    const PREFIXES: [&'static str; 2] = ["builtin/", "type_"];

    pub fn new(name: &str) -> TypeKey {
        let unprefixed = Self::PREFIXES
            .iter()
            .find_map(|prefix| name.strip_prefix(prefix))
            .unwrap_or(name);

        TypeKey(unprefixed.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> TypeKey {
        TypeKey::new(name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Maps type names to field decoders
///
/// Lookups never fail; names without a registered decoder get the [`GenericDecoder`].
pub struct DecoderRegistry {
    decoders: HashMap<TypeKey, Box<dyn FieldDecoder>>,
    fallback: GenericDecoder,
}

impl DecoderRegistry {
    /// Creates a registry without any type specific decoders
    pub fn new() -> DecoderRegistry {
        DecoderRegistry {
            decoders: HashMap::new(),
            fallback: GenericDecoder,
        }
    }

    /// Creates a registry with decoders for the runtime's built-in types
    pub fn builtin() -> DecoderRegistry {
        let builtins: Vec<(&str, Box<dyn FieldDecoder>)> = vec![
            ("bool", Box::new(BoolDecoder)),
            ("float", Box::new(FloatDecoder)),
            ("nil", Box::new(NilDecoder)),
            ("array", Box::new(ArrayDecoder)),
            ("array_slots", Box::new(SlotsDecoder)),
            ("tuple", Box::new(SlotsDecoder)),
            ("symbol", Box::new(SymbolDecoder)),
            ("string", Box::new(StringDecoder)),
            ("bytes", Box::new(BytesDecoder)),
            ("type", Box::new(TypeDecoder)),
        ];

        let mut registry = DecoderRegistry::new();
        for (name, decoder) in builtins {
            if let Err(err) = registry.register_decoder(name, decoder) {
                panic!("invalid built-in decoder table: {}", err);
            }
        }

        registry
    }

    /// Registers a decoder for the named type
    ///
    /// Each normalised name can only be registered once.
    pub fn register_decoder(
        &mut self,
        type_name: &str,
        decoder: Box<dyn FieldDecoder>,
    ) -> Result<(), ConfigurationError> {
        use std::collections::hash_map::Entry;

        match self.decoders.entry(TypeKey::new(type_name)) {
            Entry::Occupied(occupied) => Err(ConfigurationError::DuplicateDecoder(
                occupied.key().to_string(),
            )),
            Entry::Vacant(vacant) => {
                vacant.insert(decoder);
                Ok(())
            }
        }
    }

    /// Returns the decoder registered for the type name, if any
    pub fn get(&self, type_name: &str) -> Option<&dyn FieldDecoder> {
        self.decoders
            .get(&TypeKey::new(type_name))
            .map(|decoder| decoder.as_ref())
    }

    /// Returns the decoder for a possibly unresolved type name
    pub fn lookup(&self, type_name: Option<&str>) -> &dyn FieldDecoder {
        match type_name.and_then(|type_name| self.get(type_name)) {
            Some(decoder) => decoder,
            None => {
                tracing::debug!(?type_name, "using generic decoder");
                &self.fallback
            }
        }
    }

    /// Returns if a type specific decoder is registered for the name
    pub fn contains(&self, type_name: &str) -> bool {
        self.get(type_name).is_some()
    }

    /// Iterates over the registered type keys in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.decoders.keys()
    }
}

impl Default for DecoderRegistry {
    fn default() -> DecoderRegistry {
        DecoderRegistry::builtin()
    }
}
