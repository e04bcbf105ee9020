use crate::decoders::{FieldDecoder, FieldIter, FieldValue};
use crate::error::Result;
use crate::header::ObjectHeader;
use crate::object::ObjectRef;
use crate::tagged::Tagged;
use crate::target::{Memory, Width};

/// Size of one part of an object as declared by its type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Fixed(u64),
    /// Each instance stores its own size at the start of the part
    Extendable,
}

impl Extent {
    fn from_word(word: u64, width: Width) -> Extent {
        if width.to_signed(word) == -1 {
            Extent::Extendable
        } else {
            Extent::Fixed(word)
        }
    }
}

/// Object layout read from a type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLayout {
    pub slots: Extent,
    pub bytes: Extent,
}

impl TypeLayout {
    /// Index of `slots_num` among the descriptor's body words
    const SLOTS_NUM_INDEX: usize = 3;

    /// Reads the layout of the type descriptor at `type_address` with a single read
    pub fn read(memory: Memory<'_>, type_address: u64) -> Result<TypeLayout> {
        let width = memory.width();
        let offset = ObjectHeader::size(width) + Self::SLOTS_NUM_INDEX * memory.word_size();

        let address = memory.offset_address(type_address, offset as u64, 2 * memory.word_size())?;
        let words = memory.read_words(address, 2)?;
        Ok(TypeLayout {
            slots: Extent::from_word(words[0], width),
            bytes: Extent::from_word(words[1], width),
        })
    }
}

static TYPE_FIELD_NAMES: [&str; 6] = [
    "methods",
    "name_map",
    "statics",
    "slots_num",
    "bytes_len",
    "obj_size",
];

/// `Type`: the descriptor every object header points at
///
/// The first three words are references to method, name map and statics tables. They are
/// followed by the instance layout: slot count, byte length and total object size. A slot count
/// or byte length of `-1` marks that part as extendable.
pub struct TypeDecoder;

impl FieldDecoder for TypeDecoder {
    fn fields<'t>(&self, object: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
        let object = *object;

        Ok(Box::new(TYPE_FIELD_NAMES.iter().enumerate().map(
            move |(index, name)| {
                let value = object
                    .read_word(object.body_word_offset(index))
                    .map(|word| {
                        if index < TypeLayout::SLOTS_NUM_INDEX {
                            FieldValue::Value(Tagged::classify(word, object.width()))
                        } else {
                            FieldValue::Int(object.width().to_signed(word))
                        }
                    });

                ((*name).to_owned(), value)
            },
        )))
    }
}
