//! Integration tests for the binary wire format.

use std::collections::{BTreeMap, HashMap};

use glam::Vec3;
use proptree::binary::{
    decode_property, encode_property, parse_header, FLAG_HEADER_PRESENT, FLAG_LARGE_ELEMENT_SIZE,
    HEADER_SIZE, MAGIC,
};
use proptree::prelude::*;
use proptree::{Array, ContainerType, Deserializer, PropertyType, RawProperty, Scalar, Serializer};

use tempfile::NamedTempFile;

fn all_shapes() -> Archive {
    let mut archive = Archive::new();
    let mut root = archive.root_mut();
    root.set_property("i8_min", &i8::MIN).expect("set");
    root.set_property("i8_max", &i8::MAX).expect("set");
    root.set_property("i64_min", &i64::MIN).expect("set");
    root.set_property("i64_max", &i64::MAX).expect("set");
    root.set_property("u32", &u32::MAX).expect("set");
    root.set_property("i128", &-7i128).expect("set");
    root.set_property("zero", &0i16).expect("set");
    root.set_property("negative", &-2.5f64).expect("set");
    root.set_property("float", &0.125f32).expect("set");
    root.set_property("flag", &true).expect("set");
    root.insert_property("char", Property::Scalar(Scalar::Character(b'q')))
        .expect("set");
    root.set_property("vec1", &[4u8]).expect("set");
    root.set_property("vec3", &Vec3::new(1.0, -2.0, 3.5)).expect("set");
    root.set_property("vec4", &[1i64, 2, 3, 4]).expect("set");
    root.set_property("ints", &vec![-1i32, 0, 1]).expect("set");
    root.set_property("bools", &vec![true, false]).expect("set");
    root.set_property("names", &vec!["", "one", "two"]).expect("set");
    root.set_property("no_ints", &Vec::<i16>::new()).expect("set");
    root.insert_property("untyped", Property::Array(Array::Empty))
        .expect("set");
    root.set_property("text", "hello").expect("set");
    root.set_property("empty_text", "").expect("set");
    root.set_binary_block("blob", &[0, 1, 254, 255]).expect("set");
    root.insert_property("bytes", Property::String(b"raw\0bytes".to_vec()))
        .expect("set");

    let mut child = root.create_child("child").expect("child");
    child.set_property("depth", &1u8).expect("set");
    child.create_child("leaf").expect("leaf");

    let ids = root.create_object_array("items", 2).expect("items");
    root.object_mut(ids[1])
        .expect("item")
        .set_property("label", "second")
        .expect("set");
    root.create_object_array("no_items", 0).expect("no items");

    root.set_property("scores", &scores()).expect("set");
    root.set_property("lookup", &lookup()).expect("set");
    root.set_property("pair", &(3u16, "three".to_string())).expect("set");
    archive
}

fn scores() -> BTreeMap<String, i32> {
    [("alice".to_string(), 3), ("bob".to_string(), -7)].into_iter().collect()
}

fn lookup() -> HashMap<u8, Vec3> {
    [(1, Vec3::X), (2, Vec3::new(0.5, 0.0, -1.0))].into_iter().collect()
}

#[test]
fn test_round_trip_every_shape() {
    let archive = all_shapes();
    for params in [
        BinaryParams::default(),
        BinaryParams::HEADERLESS,
        BinaryParams {
            encode_header: true,
            large_element_size: true,
        },
    ] {
        let bytes = archive.to_bytes(params).expect("encode");
        let decoded = Archive::from_bytes(&bytes).expect("decode");
        assert_eq!(decoded, archive, "params {:?}", params);
    }
}

#[test]
fn test_typed_read_back_after_decode() {
    let bytes = all_shapes().to_bytes(BinaryParams::default()).expect("encode");
    let decoded = Archive::from_bytes(&bytes).expect("decode");
    let root = decoded.root();

    assert_eq!(root.get::<i8>("i8_min"), Some(i8::MIN));
    assert_eq!(root.get::<u32>("u32"), Some(u32::MAX));
    assert_eq!(root.get::<i128>("i128"), Some(-7));
    assert_eq!(root.get::<[u8; 1]>("vec1"), Some([4]));
    assert_eq!(root.get::<Vec3>("vec3"), Some(Vec3::new(1.0, -2.0, 3.5)));
    assert_eq!(root.get::<[i64; 4]>("vec4"), Some([1, 2, 3, 4]));
    assert_eq!(root.get::<Vec<i32>>("ints"), Some(vec![-1, 0, 1]));
    assert_eq!(root.get::<Vec<i16>>("no_ints"), Some(vec![]));
    assert_eq!(root.get::<String>("text").as_deref(), Some("hello"));

    assert_eq!(root.get::<BTreeMap<String, i32>>("scores"), Some(scores()));
    assert_eq!(root.get::<HashMap<u8, Vec3>>("lookup"), Some(lookup()));
    assert_eq!(
        root.get::<(u16, String)>("pair"),
        Some((3, "three".to_string()))
    );

    let child = root.get_object("child").expect("child");
    assert_eq!(child.get::<u8>("depth"), Some(1));
}

#[test]
fn test_typed_stream_values() {
    let frames: Vec<f32> = vec![0.0, 0.5, 1.0];
    let mut ser = Serializer::new(Vec::new(), BinaryParams::default()).expect("serializer");
    ser.add_value("clip").expect("name");
    ser.add_value(&24u32).expect("rate");
    ser.add_value(&Vec3::Y).expect("axis");
    ser.add_value(&frames).expect("frames");
    ser.add_value(&scores()).expect("scores");
    ser.add_value(&lookup()).expect("lookup");
    let bytes = ser.into_inner();

    let mut de = Deserializer::new(&bytes).expect("deserializer");
    assert_eq!(de.get_value::<String>().expect("name"), "clip");
    assert_eq!(de.get_value::<u32>().expect("rate"), 24);
    assert_eq!(de.get_value::<Vec3>().expect("axis"), Vec3::Y);
    assert_eq!(de.get_value::<Vec<f32>>().expect("frames"), frames);
    assert_eq!(de.get_value::<BTreeMap<String, i32>>().expect("scores"), scores());
    assert_eq!(de.get_value::<HashMap<u8, Vec3>>().expect("lookup"), lookup());
    assert!(de.is_finished());

    // The same records read one by one.
    let records = Deserializer::new(&bytes).expect("deserializer").read_all().expect("records");
    assert_eq!(records[0].1.as_str(), Some("clip"));
    assert_eq!(records[2].1.container_type, ContainerType::Vec3);
}

#[test]
fn test_header_describes_layout() {
    let archive = all_shapes();

    let bytes = archive.to_bytes(BinaryParams::default()).expect("encode");
    assert_eq!(&bytes[..2], MAGIC);
    assert_eq!(bytes[3], FLAG_HEADER_PRESENT);
    assert_eq!(parse_header(&bytes).expect("header"), BinaryParams::default());

    let large = BinaryParams {
        encode_header: true,
        large_element_size: true,
    };
    let bytes = archive.to_bytes(large).expect("encode");
    assert_eq!(bytes[3], FLAG_HEADER_PRESENT | FLAG_LARGE_ELEMENT_SIZE);

    let headerless = archive.to_bytes(BinaryParams::HEADERLESS).expect("encode");
    let with_header = archive.to_bytes(BinaryParams::default()).expect("encode");
    assert_eq!(&with_header[HEADER_SIZE..], &headerless[..]);
}

#[test]
fn test_vectors_carry_no_count() {
    let raw = encode_property(
        &Property::vector(Array::Float32(vec![1.0, 2.0, 3.0])).expect("vec3"),
        &BinaryParams::HEADERLESS,
    )
    .expect("encode");
    assert_eq!(raw.container_type, ContainerType::Vec3);
    assert_eq!(raw.payload().len(), 12);

    let mut ser = Serializer::new(Vec::new(), BinaryParams::HEADERLESS).expect("serializer");
    ser.write_property(&raw).expect("write");
    let bytes = ser.into_inner();
    assert_eq!(bytes.len(), 2 + 12);
    assert_eq!(bytes[0], ContainerType::Vec3 as u8);
    assert_eq!(bytes[1], PropertyType::Float32 as u8);
}

#[test]
fn test_flat_record_stream() {
    let params = BinaryParams::default();
    let records = [
        ("count", Property::Scalar(Scalar::Int32(5))),
        ("ratio", Property::Scalar(Scalar::Float64(0.5))),
        ("name", Property::NullTermString("flat".to_string())),
        ("list", Property::Array(Array::Int16(vec![1, 2, 3]))),
    ];

    let mut ser = Serializer::new(Vec::new(), params).expect("serializer");
    ser.write_properties(
        records
            .iter()
            .map(|(name, p)| (*name, encode_property(p, &params).expect("encode"))),
    )
    .expect("write");
    let bytes = ser.into_inner();

    let mut de = Deserializer::new(&bytes).expect("deserializer");
    assert_eq!(de.params(), params);
    let read = de.read_all().expect("read");
    assert!(de.is_finished());
    assert_eq!(read.len(), records.len());
    for (i, ((name, raw), (_, expected))) in read.iter().zip(&records).enumerate() {
        assert_eq!(name, &i.to_string());
        assert!(raw.is_borrowed());
        assert_eq!(&decode_property(raw, &params).expect("decode"), expected);
    }
}

#[test]
fn test_concrete_scenario() {
    let mut archive = Archive::new();
    {
        let mut root = archive.root_mut();
        root.set_property("a", &5i32).expect("a");
        root.set_property("b", &3.14f32).expect("b");
        root.set_property("c", &vec![1i32, 2, 3]).expect("c");
        root.set_property("d", "hello").expect("d");
    }

    let bytes = archive.to_bytes(BinaryParams::default()).expect("encode");
    let decoded = Archive::from_bytes(&bytes).expect("decode");
    let root = decoded.root();

    let mut c: Vec<i32> = Vec::new();
    assert!(root.get_property("c", &mut c));
    assert_eq!(c, [1, 2, 3]);
    let mut d = String::new();
    assert!(root.get_property("d", &mut d));
    assert_eq!(d, "hello");
    assert_eq!(root.get::<i32>("a"), Some(5));
    assert_eq!(root.get::<f32>("b"), Some(3.14));
}

#[test]
fn test_small_counts_overflow() {
    let mut archive = Archive::new();
    archive
        .root_mut()
        .set_property("big", &vec![0u8; u16::MAX as usize + 1])
        .expect("set");

    assert!(matches!(
        archive.to_bytes(BinaryParams::default()),
        Err(Error::CountOverflow { .. })
    ));

    let large = BinaryParams {
        encode_header: true,
        large_element_size: true,
    };
    let bytes = archive.to_bytes(large).expect("large counts");
    assert_eq!(Archive::from_bytes(&bytes).expect("decode"), archive);
}

#[test]
fn test_rejects_corrupt_input() {
    // Bad version in an otherwise valid header.
    let mut bytes = all_shapes().to_bytes(BinaryParams::default()).expect("encode");
    bytes[2] = 99;
    assert!(matches!(
        Archive::from_bytes(&bytes),
        Err(Error::UnsupportedVersion(99))
    ));

    // Unknown container byte.
    assert!(Archive::from_bytes(&[42, 0]).is_err());

    // Array count far past the end of the buffer.
    let mut ser = Serializer::new(Vec::new(), BinaryParams::HEADERLESS).expect("serializer");
    ser.write_property(&RawProperty::text("x")).expect("name");
    let mut bytes = ser.into_inner();
    bytes.extend_from_slice(&[ContainerType::Array as u8, PropertyType::Int64 as u8, 0xFF, 0xFF]);
    assert!(Archive::from_bytes(&bytes).is_err());
}

#[test]
fn test_file_round_trip() {
    let archive = all_shapes();
    let temp = NamedTempFile::new().expect("Failed to create temp file");

    archive
        .save(temp.path(), BinaryParams::default())
        .expect("save");
    let opened = Archive::open(temp.path()).expect("open");
    assert_eq!(opened, archive);

    let read = Archive::read_from(std::fs::File::open(temp.path()).expect("file")).expect("read");
    assert_eq!(read, archive);
}

#[test]
fn test_open_missing_and_empty_files() {
    assert!(matches!(
        Archive::open("/definitely/not/here.bin"),
        Err(Error::FileNotFound(_))
    ));

    let temp = NamedTempFile::new().expect("Failed to create temp file");
    let opened = Archive::open(temp.path()).expect("empty file");
    assert!(opened.root().is_empty());
}
