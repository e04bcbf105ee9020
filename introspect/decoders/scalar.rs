use crate::decoders::{no_fields, FieldDecoder, FieldIter, FieldValue};
use crate::error::Result;
use crate::object::ObjectRef;

/// `Bool`: a single byte after the header
pub struct BoolDecoder;

impl BoolDecoder {
    fn read_value(object: &ObjectRef<'_>) -> Result<bool> {
        let bytes = object.read_bytes(object.body_offset(), 1)?;
        Ok(bytes[0] != 0)
    }
}

impl FieldDecoder for BoolDecoder {
    fn value_repr(&self, object: &ObjectRef<'_>) -> Result<Option<String>> {
        Ok(Some(Self::read_value(object)?.to_string()))
    }

    fn fields<'t>(&self, object: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
        let object = *object;
        Ok(Box::new(std::iter::once_with(move || {
            (
                "value".to_owned(),
                Self::read_value(&object).map(FieldValue::Bool),
            )
        })))
    }
}

/// `Float`: a binary64 value after the header
pub struct FloatDecoder;

impl FloatDecoder {
    fn read_value(object: &ObjectRef<'_>) -> Result<f64> {
        let address = object.address_at(object.body_offset(), 8)?;
        object.memory().read_f64(address)
    }
}

impl FieldDecoder for FloatDecoder {
    fn value_repr(&self, object: &ObjectRef<'_>) -> Result<Option<String>> {
        Ok(Some(format!("{:?}", Self::read_value(object)?)))
    }

    fn fields<'t>(&self, object: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
        let object = *object;
        Ok(Box::new(std::iter::once_with(move || {
            (
                "value".to_owned(),
                Self::read_value(&object).map(FieldValue::Float),
            )
        })))
    }
}

/// `Nil`: header only
pub struct NilDecoder;

impl FieldDecoder for NilDecoder {
    fn value_repr(&self, _: &ObjectRef<'_>) -> Result<Option<String>> {
        Ok(Some("nil".to_owned()))
    }

    fn fields<'t>(&self, _: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
        Ok(no_fields())
    }
}
