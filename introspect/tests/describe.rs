use std::cell::RefCell;

use zis_introspect::image::{ImageBuilder, MemoryImage};
use zis_introspect::tagged::{encode_smallint, smallint_range};
use zis_introspect::*;

/// Target wrapper recording every memory read
struct Recording<T> {
    inner: T,
    reads: RefCell<Vec<(u64, usize)>>,
}

impl<T: Target> Recording<T> {
    fn new(inner: T) -> Recording<T> {
        Recording {
            inner,
            reads: RefCell::new(vec![]),
        }
    }

    fn read_count(&self) -> usize {
        self.reads.borrow().len()
    }

    fn last_read(&self) -> Option<(u64, usize)> {
        self.reads.borrow().last().cloned()
    }
}

impl<T: Target> Target for Recording<T> {
    fn read_memory(
        &self,
        address: u64,
        size: usize,
    ) -> std::result::Result<Vec<u8>, MemoryAccessError> {
        self.reads.borrow_mut().push((address, size));
        self.inner.read_memory(address, size)
    }

    fn resolve_type_name(&self, address: u64) -> Option<String> {
        self.inner.resolve_type_name(address)
    }

    fn architecture_width(&self) -> Width {
        self.inner.architecture_width()
    }

    fn byte_order(&self) -> ByteOrder {
        self.inner.byte_order()
    }
}

/// Descriptors for the built-in types
struct Types {
    bool: u64,
    float: u64,
    nil: u64,
    array: u64,
    array_slots: u64,
    tuple: u64,
    symbol: u64,
    string: u64,
    bytes: u64,
    type_: u64,
}

impl Types {
    fn lay_out(builder: &mut ImageBuilder) -> Types {
        let type_ = builder.type_descriptor("builtin/Type", Some(3), Some(3 * 8));
        Types {
            type_,
            bool: builder.type_descriptor("builtin/Bool", Some(0), Some(1)),
            float: builder.type_descriptor("builtin/Float", Some(0), Some(8)),
            nil: builder.type_descriptor("builtin/Nil", Some(0), Some(0)),
            array: builder.type_descriptor("builtin/Array", Some(1), Some(8)),
            array_slots: builder.type_descriptor("type_Array_Slots", None, Some(0)),
            tuple: builder.type_descriptor("builtin/Tuple", None, Some(0)),
            symbol: builder.type_descriptor("builtin/Symbol", Some(0), None),
            string: builder.type_descriptor("builtin/String", Some(0), None),
            bytes: builder.type_descriptor("builtin/Bytes", Some(0), None),
        }
    }
}

fn heap(width: Width) -> (ImageBuilder, Types) {
    let mut builder = ImageBuilder::new(width).at(0x10_0000);
    let types = Types::lay_out(&mut builder);
    (builder.at(0x20_0000), types)
}

fn introspect(builder: ImageBuilder) -> Introspector<Recording<MemoryImage>> {
    Introspector::new(Recording::new(builder.build()))
}

fn describe_object<'i, T: Target>(
    introspector: &'i Introspector<T>,
    address: u64,
) -> ObjectDescription<'i> {
    match introspector.describe(address).unwrap() {
        Description::Object(object) => object,
        other => panic!("expected an object, got {}", other),
    }
}

fn field_names(object: &ObjectDescription<'_>) -> Vec<String> {
    object.fields().unwrap().map(|field| field.name).collect()
}

fn field_values(object: &ObjectDescription<'_>) -> Vec<FieldValue> {
    object.fields().unwrap().map(|field| field.value).collect()
}

fn empty_introspector(width: Width) -> Introspector<MemoryImage> {
    Introspector::new(MemoryImage::new(width, ByteOrder::Little))
}

#[test]
fn smallint_round_trip() {
    for width in &[Width::W32, Width::W64] {
        let width = *width;
        let introspector = empty_introspector(width);
        let range = smallint_range(width);

        let boundaries = [0, -1, 1, *range.start(), *range.end()];
        let odd_words = boundaries
            .iter()
            .map(|value| encode_smallint(*value, width).unwrap())
            .chain((0..64u64).map(|i| (i.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1) & width.mask()));

        for word in odd_words {
            let value = match introspector.describe(word).unwrap() {
                Description::SmallInt(value) => value,
                other => panic!("{:#x} described as {}", word, other),
            };

            assert!(range.contains(&value));
            assert_eq!(Some(word), encode_smallint(value, width), "{:#x}", word);
        }
    }
}

#[test]
fn smallint_boundaries() {
    let introspector = empty_introspector(Width::W32);

    for (word, expected) in &[
        (0x1u64, 0i64),
        (0xffff_ffff, -1),
        (0x7fff_ffff, (1 << 30) - 1),
        (0x8000_0001, -(1 << 30)),
    ] {
        assert_eq!(
            format!("smallint{{{}}}", expected),
            introspector.describe(*word).unwrap().to_string()
        );
    }

    let introspector = empty_introspector(Width::W64);
    match introspector.describe(0x8000_0000_0000_0001).unwrap() {
        Description::SmallInt(value) => assert_eq!(-(1 << 62), value),
        other => panic!("unexpected {}", other),
    }
}

#[test]
fn null_at_both_widths() {
    for width in &[Width::W32, Width::W64] {
        let introspector = Introspector::new(Recording::new(MemoryImage::new(
            *width,
            ByteOrder::Little,
        )));

        let description = introspector.describe(0).unwrap();
        assert!(matches!(description, Description::Null));
        assert_eq!("null", description.to_string());
        assert_eq!(0, introspector.target().read_count());
    }
}

#[test]
fn slots_yield_count_minus_one() {
    for stored_count in 1..=5 {
        let (mut builder, types) = heap(Width::W64);

        let mut object = builder.object(types.tuple).smallint(stored_count);
        for index in 1..stored_count {
            object = object.smallint(index * 10);
        }
        let address = object.finish();

        let introspector = introspect(builder);
        let tuple = describe_object(&introspector, address);

        let expected_names: Vec<String> =
            (0..stored_count - 1).map(|index| format!("[{}]", index)).collect();
        assert_eq!(expected_names, field_names(&tuple));

        let expected_values: Vec<FieldValue> = (1..stored_count)
            .map(|index| FieldValue::Value(Tagged::SmallInt(index * 10)))
            .collect();
        assert_eq!(expected_values, field_values(&tuple));

        assert_eq!(
            Some(format!("[{}]", stored_count - 1)),
            tuple.value_repr().unwrap()
        );
    }
}

#[test]
fn zero_slot_count_is_decode_error() {
    let (mut builder, types) = heap(Width::W64);
    let zero = builder.object(types.array_slots).smallint(0).finish();
    let negative = builder.object(types.tuple).smallint(-4).finish();
    let untagged = builder.object(types.tuple).word(4).finish();

    let introspector = introspect(builder);

    let err = describe_object(&introspector, zero).fields().unwrap_err();
    assert_eq!(
        Some(&DecodeErrorKind::InvalidSlotCount(0)),
        err.decode_kind()
    );
    assert!(err.to_string().contains(&format!("{:#x}", zero)));

    let err = describe_object(&introspector, negative).fields().unwrap_err();
    assert_eq!(
        Some(&DecodeErrorKind::InvalidSlotCount(-4)),
        err.decode_kind()
    );

    let err = describe_object(&introspector, untagged).value_repr().unwrap_err();
    assert_eq!(Some(&DecodeErrorKind::NotSmallInt(4)), err.decode_kind());
}

#[test]
fn huge_slot_count_is_decode_error() {
    let (mut builder, types) = heap(Width::W64);
    let tuple = builder.object(types.tuple).smallint(1 << 40).word(0).finish();
    let storage = builder.object(types.array_slots).smallint(1 << 40).finish();
    let array = builder.object(types.array).word(storage).word(1).finish();

    let introspector = introspect(builder);
    let expected = Some(&DecodeErrorKind::ImplausibleSize(((1 << 40) - 1) * 8));

    let described = describe_object(&introspector, tuple);
    assert_eq!(expected, described.value_repr().unwrap_err().decode_kind());

    let reads_before = introspector.target().read_count();
    assert_eq!(expected, described.fields().unwrap_err().decode_kind());
    assert_eq!(reads_before + 1, introspector.target().read_count());

    let snapshot = match described_snapshot(&introspector, tuple) {
        Snapshot::Object(object) => object,
        other => panic!("unexpected {:?}", other),
    };
    assert!(snapshot.fields.is_empty());
    assert!(snapshot.error.is_some());

    let err = describe_object(&introspector, array).fields().unwrap_err();
    assert_eq!(expected, err.decode_kind());
}

fn described_snapshot<T: Target>(introspector: &Introspector<T>, address: u64) -> Snapshot {
    introspector.describe(address).unwrap().snapshot()
}

#[test]
fn symbol_text_stops_at_nul() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder
        .object(types.symbol)
        .word(3 * 8 + 10)
        .word(0)
        .word(0xfeed)
        .bytes(b"abcd\0fghij")
        .finish();

    let introspector = introspect(builder);
    let symbol = describe_object(&introspector, address);

    assert_eq!(Some("\"abcd\"".to_owned()), symbol.value_repr().unwrap());

    let fields: Vec<Field> = symbol.fields().unwrap().collect();
    let names: Vec<&str> = fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(vec!["hash", "registry_next", "text"], names);

    assert_eq!(FieldValue::Unsigned(0xfeed), fields[0].value);
    assert_eq!(FieldValue::Value(Tagged::Null), fields[1].value);
    match &fields[2].value {
        FieldValue::Text(text) => assert_eq!(4, text.len()),
        other => panic!("unexpected {:?}", other),
    }

    // The full declared extent is read before truncation
    assert_eq!(
        Some((address + 16 + 24, 10)),
        introspector.target().last_read()
    );
}

#[test]
fn symbol_from_builder() {
    let (mut builder, types) = heap(Width::W32);
    let address = builder.symbol(types.symbol, "lambda", 42);

    let introspector = introspect(builder);
    let symbol = describe_object(&introspector, address);

    assert_eq!("builtin/Symbol", symbol.type_name().to_string());
    assert_eq!(Some("\"lambda\"".to_owned()), symbol.value_repr().unwrap());
}

#[test]
fn packed_length_read_spans_exact_size() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder
        .object(types.string)
        .word(2 * 8 + 8)
        .word((3 << 2) | 0b01)
        .uint('h' as u64, 2)
        .uint('é' as u64, 2)
        .uint('y' as u64, 2)
        .bytes(&[0xff, 0xff])
        .finish();

    let introspector = introspect(builder);
    let string = describe_object(&introspector, address);

    let mut fields = string.fields().unwrap();
    assert_eq!(
        Field {
            name: "length".to_owned(),
            value: FieldValue::Unsigned(3)
        },
        fields.next().unwrap()
    );
    assert_eq!(
        Field {
            name: "element_size".to_owned(),
            value: FieldValue::Unsigned(2)
        },
        fields.next().unwrap()
    );
    assert_eq!(
        Field {
            name: "text".to_owned(),
            value: FieldValue::Text("héy".to_owned())
        },
        fields.next().unwrap()
    );
    assert!(fields.next().is_none());

    assert_eq!(
        Some((address + 16 + 16, 6)),
        introspector.target().last_read()
    );
}

#[test]
fn packed_length_read_ignores_content() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder
        .object(types.string)
        .word(2 * 8 + 8)
        .word((3 << 2) | 0b01)
        .uint(0xd800, 2)
        .uint(0, 2)
        .uint(0, 2)
        .finish();

    let introspector = introspect(builder);
    let string = describe_object(&introspector, address);

    let err = string.value_repr().unwrap_err();
    assert_eq!(
        Some(&DecodeErrorKind::InvalidCodePoint(0xd800)),
        err.decode_kind()
    );
    assert_eq!(
        Some((address + 16 + 16, 6)),
        introspector.target().last_read()
    );
}

#[test]
fn string_escapes_to_single_line() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder.string(types.string, "two\nlines \"quoted\"");

    let introspector = introspect(builder);
    let string = describe_object(&introspector, address);

    assert_eq!(
        Some(r#""two\nlines \"quoted\"""#.to_owned()),
        string.value_repr().unwrap()
    );
}

#[test]
fn string_longer_than_extent() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder
        .object(types.string)
        .word(2 * 8 + 4)
        .word(8 << 2)
        .bytes(b"abcdefgh")
        .finish();

    let introspector = introspect(builder);
    let err = describe_object(&introspector, address)
        .value_repr()
        .unwrap_err();

    assert_eq!(
        Some(&DecodeErrorKind::LengthExceedsExtent {
            data_size: 8,
            extent: 4
        }),
        err.decode_kind()
    );
}

#[test]
fn string_with_maximum_packed_length() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder
        .object(types.string)
        .word(2 * 8 + 8)
        .word(u64::MAX)
        .bytes(b"abcdefgh")
        .finish();

    let introspector = introspect(builder);
    let string = describe_object(&introspector, address);

    let expected = Some(&DecodeErrorKind::LengthExceedsExtent {
        data_size: u64::MAX - 3,
        extent: 8,
    });
    assert_eq!(expected, string.value_repr().unwrap_err().decode_kind());
    assert_eq!(expected, string.fields().unwrap_err().decode_kind());
}

#[test]
fn wide_string_big_endian() {
    let mut builder = ImageBuilder::with_byte_order(Width::W32, ByteOrder::Big);
    let string_type = builder.type_descriptor("builtin/String", Some(0), None);
    let address = builder
        .object(string_type)
        .word(2 * 4 + 8)
        .word((2 << 2) | 0b11)
        .uint(0x1f600, 4)
        .uint('!' as u64, 4)
        .finish();

    let introspector = Introspector::new(builder.build());
    let string = describe_object(&introspector, address);

    assert_eq!(
        Some("\"\u{1f600}!\"".to_owned()),
        string.value_repr().unwrap()
    );
}

#[test]
fn invalid_utf8_becomes_placeholder() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder
        .object(types.symbol)
        .word(3 * 8 + 8)
        .word(0)
        .word(7)
        .bytes(&[0x66, 0xc3, 0x28, 0, 0, 0, 0, 0])
        .finish();

    let introspector = introspect(builder);
    let symbol = describe_object(&introspector, address);

    let err = symbol.value_repr().unwrap_err();
    assert_eq!(Some(&DecodeErrorKind::InvalidUtf8), err.decode_kind());

    let values = field_values(&symbol);
    assert_eq!(FieldValue::Unsigned(7), values[0]);
    assert!(values[2].is_unavailable());
    assert!(values[2].to_string().starts_with("<decode error: "));
}

#[test]
fn implausible_symbol_size() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder
        .object(types.symbol)
        .word(u64::from(u32::MAX))
        .word(0)
        .word(0)
        .finish();

    let introspector = introspect(builder);
    let err = describe_object(&introspector, address)
        .value_repr()
        .unwrap_err();

    assert_eq!(
        Some(&DecodeErrorKind::ImplausibleSize(u64::from(u32::MAX) - 24)),
        err.decode_kind()
    );
}

fn describe_gc_state(meta_bits: GcState, marked: bool) -> (GcState, bool) {
    let mut builder = ImageBuilder::new(Width::W64);
    let address = builder
        .object(0x4000)
        .gc_state(meta_bits)
        .marked(marked)
        .gc_ptr(0x8000)
        .finish();

    let introspector = introspect(builder);
    let object = describe_object(&introspector, address);

    assert_eq!(0x4000, object.header().type_addr());
    assert_eq!(0x8000, object.header().gc_ptr());
    (object.header().gc_state(), object.header().marked())
}

#[test]
fn gc_state_new() {
    assert_eq!((GcState::New, false), describe_gc_state(GcState::New, false));
}

#[test]
fn gc_state_mid() {
    assert_eq!((GcState::Mid, true), describe_gc_state(GcState::Mid, true));
}

#[test]
fn gc_state_old() {
    assert_eq!((GcState::Old, false), describe_gc_state(GcState::Old, false));
}

#[test]
fn gc_state_big() {
    assert_eq!((GcState::Big, true), describe_gc_state(GcState::Big, true));
}

#[test]
fn unregistered_type_uses_generic_decoder() {
    let registry = DecoderRegistry::builtin();
    let _ = registry.lookup(Some("builtin/Widget"));
    let _ = registry.lookup(None);

    let (mut builder, _) = heap(Width::W64);
    let widget_type = builder.type_descriptor("builtin/Widget", Some(2), Some(3));
    let widget = builder
        .object(widget_type)
        .smallint(5)
        .word(0)
        .bytes(&[1, 2, 3])
        .finish();

    let introspector = introspect(builder);
    let widget = describe_object(&introspector, widget);

    assert_eq!(None, widget.value_repr().unwrap());
    assert_eq!(vec!["slot[0]", "slot[1]", "bytes"], field_names(&widget));
    assert_eq!(
        vec![
            FieldValue::Value(Tagged::SmallInt(5)),
            FieldValue::Value(Tagged::Null),
            FieldValue::Bytes(vec![1, 2, 3]),
        ],
        field_values(&widget)
    );
}

#[test]
fn type_address_at_end_of_address_space() {
    let mut builder = ImageBuilder::new(Width::W64);
    let address = builder
        .object(0xffff_ffff_ffff_fffc)
        .gc_state(GcState::Big)
        .finish();

    let introspector = Introspector::new(builder.build());
    let object = describe_object(&introspector, address);

    assert_eq!("<0xfffffffffffffffc>", object.type_name().to_string());
    assert_eq!(None, object.value_repr().unwrap());
    assert!(object.fields().unwrap_err().is_memory_access());
}

#[test]
fn generic_decoder_extendable_parts() {
    let (mut builder, _) = heap(Width::W32);
    let blob_type = builder.type_descriptor("Blob", None, None);
    let blob = builder
        .object(blob_type)
        .smallint(3)
        .word(0x10_0000)
        .smallint(-1)
        .word(4 + 2)
        .bytes(&[9, 8])
        .finish();

    let introspector = introspect(builder);
    let blob = describe_object(&introspector, blob);

    assert_eq!(
        vec![
            FieldValue::Value(Tagged::SmallInt(3)),
            FieldValue::Value(Tagged::Reference(0x10_0000)),
            FieldValue::Value(Tagged::SmallInt(-1)),
            FieldValue::Bytes(vec![9, 8]),
        ],
        field_values(&blob)
    );
}

#[test]
fn unresolved_type_scenario() {
    let mut builder = ImageBuilder::new(Width::W64);
    let address = builder
        .object(0x2004)
        .gc_state(GcState::Mid)
        .marked(true)
        .finish();
    assert_eq!(0x1000, address);

    let introspector = introspect(builder);
    let description = introspector.describe(0x1000).unwrap();

    let object = description.as_object().unwrap();
    assert_eq!(0x1000, object.address());
    assert_eq!(&TypeName::Opaque(0x2004), object.type_name());
    assert_eq!("<0x2004>", object.type_name().to_string());
    assert_eq!(GcState::Mid, object.header().gc_state());
    assert!(object.header().marked());

    assert_eq!(
        "0x1000 zis_object{ type=<0x2004>, gc_info={state=MID, marked=true} }",
        description.to_string()
    );

    let json = serde_json::to_value(description.snapshot()).unwrap();
    assert_eq!("object", json["kind"]);
    assert_eq!(0x1000, json["address"]);
    assert_eq!("<0x2004>", json["type_name"]);
    assert_eq!(
        serde_json::json!({ "state": "MID", "marked": true }),
        json["gc"]
    );
    // The descriptor at 0x2004 is not mapped so the generic decoder cannot locate any fields
    assert!(json["error"].is_string());
}

#[test]
fn header_only_describe_reads_once() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder.string(types.string, "untouched");

    let introspector = introspect(builder);
    let string = describe_object(&introspector, address);

    assert_eq!(1, introspector.target().read_count());
    assert_eq!(Some((address, 16)), introspector.target().last_read());
    assert_eq!("builtin/String", string.type_name().to_string());
}

#[test]
fn one_read_per_field() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder.slots(types.tuple, &[1, 3, 5, 7]);

    let introspector = introspect(builder);
    let tuple = describe_object(&introspector, address);
    let target = introspector.target();

    let mut fields = tuple.fields().unwrap();
    assert_eq!(2, target.read_count());

    for expected in 1..=4 {
        assert!(fields.next().is_some());
        assert_eq!(2 + expected, target.read_count());
    }

    assert!(fields.next().is_none());
    assert_eq!(6, target.read_count());
}

#[test]
fn abandoned_iteration_stops_reading() {
    let (mut builder, types) = heap(Width::W64);
    let address = builder.symbol(types.symbol, "never-read", 1);

    let introspector = introspect(builder);
    let symbol = describe_object(&introspector, address);

    let first: Vec<Field> = symbol.fields().unwrap().take(2).collect();
    assert_eq!(2, first.len());
    // Header plus the fixed words; the text is never read
    assert_eq!(2, introspector.target().read_count());
}

#[test]
fn misaligned_reference_rejected_before_reading() {
    let introspector = introspect(ImageBuilder::new(Width::W64));

    let err = introspector.describe(0x1002).unwrap_err();
    assert_eq!(
        Some(&DecodeErrorKind::MisalignedReference),
        err.decode_kind()
    );
    assert_eq!(0, introspector.target().read_count());
}

#[test]
fn unmapped_reference_is_memory_error() {
    let introspector = introspect(ImageBuilder::new(Width::W64));

    let err = introspector.describe(0x9000).unwrap_err();
    assert!(err.is_memory_access());
    assert_eq!(
        Error::MemoryAccess(MemoryAccessError::new(
            0x9000,
            16,
            "address range is not mapped"
        )),
        err
    );
}

#[test]
fn array_elements_come_from_storage() {
    let (mut builder, types) = heap(Width::W64);
    let storage = builder.slots(types.array_slots, &[3, 5, 0, 0]);
    let array = builder.object(types.array).word(storage).word(2).finish();
    let overlong = builder.object(types.array).word(storage).word(5).finish();
    let detached = builder.object(types.array).word(0).word(0).finish();

    let introspector = introspect(builder);

    let described = describe_object(&introspector, array);
    assert_eq!(Some("[2]".to_owned()), described.value_repr().unwrap());
    assert_eq!(
        vec![
            FieldValue::Value(Tagged::SmallInt(1)),
            FieldValue::Value(Tagged::SmallInt(2)),
        ],
        field_values(&described)
    );

    let err = describe_object(&introspector, overlong)
        .fields()
        .unwrap_err();
    assert_eq!(
        Some(&DecodeErrorKind::LengthExceedsStorage {
            length: 5,
            capacity: 4
        }),
        err.decode_kind()
    );

    let err = describe_object(&introspector, detached)
        .fields()
        .unwrap_err();
    assert_eq!(Some(&DecodeErrorKind::NotReference(0)), err.decode_kind());
}

#[test]
fn nested_values_can_be_described() {
    let (mut builder, types) = heap(Width::W64);
    let name = builder.string(types.string, "inner");
    let tuple = builder.slots(types.tuple, &[name, 0]);

    let introspector = introspect(builder);
    let tuple = describe_object(&introspector, tuple);

    let first = tuple.fields().unwrap().next().unwrap();
    let nested = match first.value.as_tagged() {
        Some(tagged) => introspector.describe_tagged(tagged).unwrap(),
        None => panic!("expected a tagged value"),
    };

    let nested = nested.as_object().unwrap();
    assert_eq!(name, nested.address());
    assert_eq!(Some("\"inner\"".to_owned()), nested.value_repr().unwrap());
}

#[test]
fn scalar_objects() {
    let (mut builder, types) = heap(Width::W32);
    let truth = builder.object(types.bool).bytes(&[1]).finish();
    let float = builder.object(types.float).f64(-2.5).finish();
    let nil = builder.object(types.nil).finish();
    let bytes = builder.bytes(types.bytes, b"a\0\"");

    let introspector = introspect(builder);

    let truth = describe_object(&introspector, truth);
    assert_eq!(Some("true".to_owned()), truth.value_repr().unwrap());
    assert_eq!(vec![FieldValue::Bool(true)], field_values(&truth));

    let float = describe_object(&introspector, float);
    assert_eq!(Some("-2.5".to_owned()), float.value_repr().unwrap());
    assert_eq!(vec!["value"], field_names(&float));

    let nil = describe_object(&introspector, nil);
    assert_eq!(Some("nil".to_owned()), nil.value_repr().unwrap());
    assert!(field_names(&nil).is_empty());

    let bytes = describe_object(&introspector, bytes);
    assert_eq!(
        Some(r#"b"a\x00\"""#.to_owned()),
        bytes.value_repr().unwrap()
    );
    assert_eq!(
        vec![FieldValue::Unsigned(3), FieldValue::Bytes(b"a\0\"".to_vec())],
        field_values(&bytes)
    );
}

#[test]
fn type_descriptor_fields() {
    let (builder, types) = heap(Width::W64);
    let introspector = introspect(builder);

    let descriptor = describe_object(&introspector, types.symbol);
    assert_eq!(types.type_, descriptor.header().type_addr());
    assert_eq!("builtin/Type", descriptor.type_name().to_string());

    let fields: Vec<Field> = descriptor.fields().unwrap().collect();
    let names: Vec<&str> = fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(
        vec!["methods", "name_map", "statics", "slots_num", "bytes_len", "obj_size"],
        names
    );
    assert_eq!(FieldValue::Value(Tagged::Null), fields[0].value);
    assert_eq!(FieldValue::Int(0), fields[3].value);
    assert_eq!(FieldValue::Int(-1), fields[4].value);
}

#[test]
fn custom_decoder_registration() {
    struct Opaque;

    impl FieldDecoder for Opaque {
        fn value_repr(&self, _: &ObjectRef<'_>) -> Result<Option<String>> {
            Ok(Some("opaque".to_owned()))
        }

        fn fields<'t>(&self, _: &ObjectRef<'t>) -> Result<FieldIter<'t>> {
            Ok(Box::new(std::iter::empty()))
        }
    }

    let (mut builder, _) = heap(Width::W64);
    let widget_type = builder.type_descriptor("type_Widget", Some(0), Some(0));
    let widget = builder.object(widget_type).finish();

    let mut introspector = introspect(builder);
    introspector
        .register_decoder("builtin/Widget", Box::new(Opaque))
        .unwrap();

    assert_eq!(
        ConfigurationError::DuplicateDecoder("string".to_owned()),
        introspector
            .register_decoder("String", Box::new(Opaque))
            .unwrap_err()
    );

    let widget = describe_object(&introspector, widget);
    assert_eq!(Some("opaque".to_owned()), widget.value_repr().unwrap());
}

#[test]
fn snapshot_serialises_fields() {
    let (mut builder, types) = heap(Width::W64);
    let name = builder.string(types.string, "x");
    let tuple = builder.slots(types.tuple, &[name, 7]);

    let introspector = introspect(builder);
    let json = serde_json::to_value(introspector.describe(tuple).unwrap().snapshot()).unwrap();

    assert_eq!("[2]", json["value"]);
    assert_eq!(
        serde_json::json!([
            { "name": "[0]", "value": format!("{:#x}", name), "reference": true },
            { "name": "[1]", "value": "smallint{3}", "reference": false },
        ]),
        json["fields"]
    );
    assert!(json.get("error").is_none());

    let json = serde_json::to_value(introspector.describe(7).unwrap().snapshot()).unwrap();
    assert_eq!(serde_json::json!({ "kind": "smallint", "value": 3 }), json);
}
