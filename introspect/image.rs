//! In-process memory images
//!
//! A [`MemoryImage`] is a [`Target`] backed by byte segments held in memory. Hosts use it to
//! describe captured snapshots of a heap; [`ImageBuilder`] lays out synthetic objects.

use std::collections::HashMap;

use crate::error::MemoryAccessError;
use crate::header::GcState;
use crate::registry::TypeKey;
use crate::tagged::encode_smallint;
use crate::target::{ByteOrder, Target, Width};

struct Segment {
    base: u64,
    data: Vec<u8>,
}

impl Segment {
    fn end(&self) -> u64 {
        self.base + self.data.len() as u64
    }
}

/// Memory image with a type name table
pub struct MemoryImage {
    width: Width,
    byte_order: ByteOrder,
    segments: Vec<Segment>,
    type_names: HashMap<u64, String>,
}

impl MemoryImage {
    pub fn new(width: Width, byte_order: ByteOrder) -> MemoryImage {
        MemoryImage {
            width,
            byte_order,
            segments: vec![],
            type_names: HashMap::new(),
        }
    }

    /// Maps `data` at `base`
    ///
    /// Segments may not overlap.
    pub fn add_segment(&mut self, base: u64, data: Vec<u8>) {
        let new_end = base + data.len() as u64;
        assert!(
            self.segments
                .iter()
                .all(|segment| new_end <= segment.base || segment.end() <= base),
            "segment at {:#x} overlaps an existing segment",
            base
        );

        self.segments.push(Segment { base, data });
    }

    pub fn add_type_name(&mut self, address: u64, name: impl Into<String>) {
        self.type_names.insert(address, name.into());
    }

    fn find_segment(&self, address: u64, size: usize) -> Option<&[u8]> {
        let end = address.checked_add(size as u64)?;

        self.segments
            .iter()
            .find(|segment| segment.base <= address && end <= segment.end())
            .map(|segment| {
                let start = (address - segment.base) as usize;
                &segment.data[start..start + size]
            })
    }
}

impl Target for MemoryImage {
    fn read_memory(
        &self,
        address: u64,
        size: usize,
    ) -> std::result::Result<Vec<u8>, MemoryAccessError> {
        self.find_segment(address, size)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| MemoryAccessError::new(address, size, "address range is not mapped"))
    }

    fn resolve_type_name(&self, address: u64) -> Option<String> {
        self.type_names.get(&address).cloned()
    }

    fn architecture_width(&self) -> Width {
        self.width
    }

    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}

/// Lays out objects for a [`MemoryImage`]
///
/// Objects are placed one after another starting at the current position. Every object starts
/// word aligned.
pub struct ImageBuilder {
    image: MemoryImage,
    base: u64,
    data: Vec<u8>,
    type_type: Option<u64>,
}

impl ImageBuilder {
    pub const DEFAULT_BASE: u64 = 0x1000;

    pub fn new(width: Width) -> ImageBuilder {
        Self::with_byte_order(width, ByteOrder::Little)
    }

    pub fn with_byte_order(width: Width, byte_order: ByteOrder) -> ImageBuilder {
        ImageBuilder {
            image: MemoryImage::new(width, byte_order),
            base: Self::DEFAULT_BASE,
            data: vec![],
            type_type: None,
        }
    }

    pub fn width(&self) -> Width {
        self.image.width
    }

    fn word_size(&self) -> usize {
        self.image.width.bytes()
    }

    /// Address the next object will be placed at
    pub fn position(&self) -> u64 {
        let word_size = self.word_size();
        let aligned_len = (self.data.len() + word_size - 1) / word_size * word_size;
        self.base + aligned_len as u64
    }

    /// Continues placing objects at `address`
    pub fn at(mut self, address: u64) -> ImageBuilder {
        self.flush();
        self.base = address;
        self
    }

    fn flush(&mut self) {
        if !self.data.is_empty() {
            let data = std::mem::take(&mut self.data);
            let base = self.base;
            self.base += data.len() as u64;
            self.image.add_segment(base, data);
        }
    }

    /// Names a type descriptor address without laying out a descriptor
    pub fn type_name(&mut self, address: u64, name: &str) {
        self.image.add_type_name(address, name);
    }

    /// Starts a new object of the given type
    pub fn object(&mut self, type_addr: u64) -> ObjectBuilder<'_> {
        let address = self.position();
        let padding = (address - self.base) as usize - self.data.len();
        self.data.extend(std::iter::repeat(0).take(padding));

        ObjectBuilder {
            builder: self,
            address,
            type_addr,
            gc_state: GcState::New,
            marked: false,
            gc_ptr: 0,
            body: vec![],
        }
    }

    /// Lays out a named type descriptor
    ///
    /// `None` for a part marks it as extendable. The first descriptor named `Type` becomes the
    /// type of every later descriptor; earlier ones are their own type.
    pub fn type_descriptor(
        &mut self,
        name: &str,
        slots_num: Option<u64>,
        bytes_len: Option<u64>,
    ) -> u64 {
        let address = self.position();
        let type_addr = self.type_type.unwrap_or(address);
        let extendable = self.image.width.mask();

        let address = self
            .object(type_addr)
            .gc_state(GcState::Old)
            .word(0)
            .word(0)
            .word(0)
            .word(slots_num.unwrap_or(extendable))
            .word(bytes_len.unwrap_or(extendable))
            .word(0)
            .finish();

        if self.type_type.is_none() && TypeKey::new(name).as_str() == "type" {
            self.type_type = Some(address);
        }

        self.type_name(address, name);
        address
    }

    /// Lays out a slots-bearing object holding `slots`
    pub fn slots(&mut self, type_addr: u64, slots: &[u64]) -> u64 {
        let mut object = self.object(type_addr).smallint(slots.len() as i64 + 1);
        for slot in slots {
            object = object.word(*slot);
        }
        object.finish()
    }

    /// Lays out a symbol with NUL padding to the word size
    pub fn symbol(&mut self, type_addr: u64, text: &str, hash: u64) -> u64 {
        let word_size = self.word_size();
        let padded_len = (text.len() / word_size + 1) * word_size;
        let bytes_size = (3 * word_size + padded_len) as u64;

        self.object(type_addr)
            .word(bytes_size)
            .word(0)
            .word(hash)
            .bytes(text.as_bytes())
            .bytes(&vec![0; padded_len - text.len()])
            .finish()
    }

    /// Lays out a string with single byte elements
    pub fn string(&mut self, type_addr: u64, text: &str) -> u64 {
        let bytes_size = (2 * self.word_size() + text.len()) as u64;

        self.object(type_addr)
            .word(bytes_size)
            .word((text.len() as u64) << 2)
            .bytes(text.as_bytes())
            .finish()
    }

    /// Lays out a bytes object
    pub fn bytes(&mut self, type_addr: u64, data: &[u8]) -> u64 {
        let bytes_size = (2 * self.word_size() + data.len()) as u64;

        self.object(type_addr)
            .word(bytes_size)
            .word(data.len() as u64)
            .bytes(data)
            .finish()
    }

    pub fn build(mut self) -> MemoryImage {
        self.flush();
        self.image
    }
}

/// Object being laid out by an [`ImageBuilder`]
pub struct ObjectBuilder<'b> {
    builder: &'b mut ImageBuilder,
    address: u64,
    type_addr: u64,
    gc_state: GcState,
    marked: bool,
    gc_ptr: u64,
    body: Vec<u8>,
}

impl<'b> ObjectBuilder<'b> {
    pub fn gc_state(mut self, gc_state: GcState) -> Self {
        self.gc_state = gc_state;
        self
    }

    pub fn marked(mut self, marked: bool) -> Self {
        self.marked = marked;
        self
    }

    pub fn gc_ptr(mut self, gc_ptr: u64) -> Self {
        self.gc_ptr = gc_ptr;
        self
    }

    fn encode_uint(&self, value: u64, size: usize) -> Vec<u8> {
        match self.builder.image.byte_order {
            ByteOrder::Little => value.to_le_bytes()[..size].to_vec(),
            ByteOrder::Big => value.to_be_bytes()[8 - size..].to_vec(),
        }
    }

    /// Appends a raw word
    pub fn word(mut self, value: u64) -> Self {
        let encoded = self.encode_uint(value, self.builder.word_size());
        self.body.extend(encoded);
        self
    }

    /// Appends a tagged small integer
    pub fn smallint(self, value: i64) -> Self {
        let width = self.builder.width();
        match encode_smallint(value, width) {
            Some(word) => self.word(word),
            None => panic!("{} does not fit in a {}-bit small integer", value, width.bits()),
        }
    }

    /// Appends an unsigned integer of `size` bytes
    pub fn uint(mut self, value: u64, size: usize) -> Self {
        let encoded = self.encode_uint(value, size);
        self.body.extend(encoded);
        self
    }

    pub fn f64(mut self, value: f64) -> Self {
        let encoded = self.encode_uint(value.to_bits(), 8);
        self.body.extend(encoded);
        self
    }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.body.extend_from_slice(data);
        self
    }

    /// Places the object and returns its address
    pub fn finish(self) -> u64 {
        let meta_1 = self.type_addr | self.gc_state.bits();
        let meta_2 = self.gc_ptr | u64::from(self.marked);

        let header = [
            self.encode_uint(meta_1, self.builder.word_size()),
            self.encode_uint(meta_2, self.builder.word_size()),
        ];

        let data = &mut self.builder.data;
        for word in header.iter() {
            data.extend_from_slice(word);
        }
        data.extend_from_slice(&self.body);

        self.address
    }
}
