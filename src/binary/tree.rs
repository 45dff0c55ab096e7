//! Whole-tree binary encoding for [`Archive`].
//!
//! The root's entries follow the header as `name value` record pairs. An
//! object value carries its entry count and then its entries in the same
//! form; an array of objects carries, per element, a count and the entries.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use super::codec::{decode_property, encode_property};
use super::format::{BinaryParams, MAX_NESTING_DEPTH};
use super::reader::Deserializer;
use super::record::RawProperty;
use super::writer::Serializer;
use crate::core::{Archive, ArchiveObject, ArchiveObjectMut, Array, Property};
use crate::util::{ContainerType, Error, PropertyType, Result};

impl Archive {
    /// Encode the whole tree.
    pub fn to_bytes(&self, params: BinaryParams) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out, params)?;
        Ok(out)
    }

    /// Encode the whole tree into `writer`.
    pub fn write_to<W: Write>(&self, writer: W, params: BinaryParams) -> Result<()> {
        let mut ser = Serializer::new(writer, params)?;
        write_entries(&mut ser, &self.root(), 0)?;
        tracing::debug!(bytes = ser.position(), "encoded archive");
        ser.flush()
    }

    /// Decode a tree, detecting the header.
    pub fn from_bytes(buf: &[u8]) -> Result<Archive> {
        Self::decode(Deserializer::new(buf)?)
    }

    /// Decode a tree with a known layout.
    pub fn from_bytes_with(buf: &[u8], params: BinaryParams) -> Result<Archive> {
        Self::decode(Deserializer::with_params(buf, params)?)
    }

    fn decode(mut de: Deserializer<'_>) -> Result<Archive> {
        let mut archive = Archive::new();
        let mut root = archive.root_mut();
        while read_entry(&mut de, &mut root)? {}
        tracing::debug!(
            nodes = archive.node_count(),
            bytes = de.offset(),
            "decoded archive"
        );
        Ok(archive)
    }

    /// Read everything from `reader` and decode it.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Archive> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::from_bytes(&buf)
    }

    /// Encode the tree into a file.
    pub fn save(&self, path: impl AsRef<Path>, params: BinaryParams) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file), params)
    }

    /// Decode a tree from a memory-mapped file.
    #[cfg(feature = "mmap")]
    pub fn open(path: impl AsRef<Path>) -> Result<Archive> {
        let file = open_file(path.as_ref())?;
        if file.metadata()?.len() == 0 {
            return Ok(Archive::new());
        }
        // Safety: the map is read-only and dropped before this function returns.
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| Error::MmapFailed(e.to_string()))?;
        Self::from_bytes(&mmap)
    }

    /// Decode a tree from a file.
    #[cfg(not(feature = "mmap"))]
    pub fn open(path: impl AsRef<Path>) -> Result<Archive> {
        Self::read_from(open_file(path.as_ref())?)
    }
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })
}

// ============================================================================
// Writing
// ============================================================================

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(Error::invalid(format!(
            "objects nested deeper than {} levels",
            MAX_NESTING_DEPTH
        )));
    }
    Ok(())
}

fn write_entries<W: Write>(ser: &mut Serializer<W>, obj: &ArchiveObject<'_>, depth: usize) -> Result<()> {
    check_depth(depth)?;
    for (name, property) in obj.iter() {
        ser.write_property(&RawProperty::text(name))?;
        write_value(ser, obj.archive(), property, depth)?;
    }
    Ok(())
}

fn write_value<W: Write>(
    ser: &mut Serializer<W>,
    archive: &Archive,
    property: &Property,
    depth: usize,
) -> Result<()> {
    match property {
        Property::Object(id) => {
            let child = node(archive, *id)?;
            ser.write_record_header(ContainerType::Object, PropertyType::Object, child.len())?;
            write_entries(ser, &child, depth + 1)
        }
        Property::Array(Array::Object(ids)) => {
            ser.write_record_header(ContainerType::Array, PropertyType::Object, ids.len())?;
            for id in ids {
                let child = node(archive, *id)?;
                ser.write_count(child.len())?;
                write_entries(ser, &child, depth + 1)?;
            }
            Ok(())
        }
        leaf => {
            let raw = encode_property(leaf, &ser.params())?;
            ser.write_property(&raw)
        }
    }
}

fn node(archive: &Archive, id: crate::core::ObjectId) -> Result<ArchiveObject<'_>> {
    archive
        .object(id)
        .ok_or_else(|| Error::invalid(format!("dangling object handle {}", id)))
}

// ============================================================================
// Reading
// ============================================================================

/// Read one `name value` pair into `obj`; false at the end of the buffer.
fn read_entry(de: &mut Deserializer<'_>, obj: &mut ArchiveObjectMut<'_>) -> Result<bool> {
    let Some(name) = de.next_property()? else {
        return Ok(false);
    };
    let name = match (name.container_type, name.as_str()) {
        (ContainerType::NullTermString, Some(text)) => text.to_string(),
        _ => {
            return Err(Error::invalid(format!(
                "expected a property name at {}, found {}/{}",
                de.offset(),
                name.property_type,
                name.container_type
            )))
        }
    };

    let (container_type, property_type, count) = de.read_record_header()?;
    match (container_type, property_type) {
        (ContainerType::Object, PropertyType::Object) => {
            let mut child = obj.create_child(&name)?;
            read_entries(de, &mut child, count)?;
        }
        (ContainerType::Array, PropertyType::Object) => {
            // Every element needs at least its count field.
            if count.saturating_mul(de.params().count_size()) > de.remaining() {
                return Err(Error::UnexpectedEof(de.offset()));
            }
            let ids = obj.create_object_array(&name, count)?;
            for id in ids {
                let entries = de.read_count()?;
                let mut child = obj
                    .object_mut(id)
                    .ok_or_else(|| Error::invalid(format!("dangling object handle {}", id)))?;
                read_entries(de, &mut child, entries)?;
            }
        }
        _ => {
            let payload = de.read_payload(property_type, container_type, count)?;
            let raw = RawProperty::new(property_type, container_type, count, payload);
            obj.insert_property(&name, decode_property(&raw, &de.params())?)?;
        }
    }
    Ok(true)
}

/// Read exactly `count` entries of a nested object.
fn read_entries(de: &mut Deserializer<'_>, obj: &mut ArchiveObjectMut<'_>, count: usize) -> Result<()> {
    de.descend()?;
    for _ in 0..count {
        if !read_entry(de, obj)? {
            return Err(Error::UnexpectedEof(de.offset()));
        }
    }
    de.ascend();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Archive {
        let mut archive = Archive::new();
        let mut root = archive.root_mut();
        root.set_property("a", &5i32).expect("set");
        let mut child = root.create_child("child").expect("child");
        child.set_property("name", "inner").expect("set");
        child.create_child("empty").expect("grandchild");
        let ids = root.create_object_array("items", 2).expect("array");
        root.object_mut(ids[0])
            .expect("node")
            .set_property("v", &1.5f64)
            .expect("set");
        archive
    }

    #[test]
    fn test_tree_round_trip() {
        let archive = sample();
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
            assert_eq!(decoded, archive);
        }
    }

    #[test]
    fn test_name_value_layout() {
        let mut archive = Archive::new();
        archive.root_mut().set_property("a", &5i32).expect("set");
        let bytes = archive.to_bytes(BinaryParams::HEADERLESS).expect("encode");
        // name record: null_term_string/character, count 2, "a\0"
        // value record: scalar/int32, 5
        assert_eq!(bytes, [3, 8, 2, 0, b'a', 0, 0, 3, 5, 0, 0, 0]);
    }

    #[test]
    fn test_headerless_needs_forced_layout_for_large_counts() {
        let archive = sample();
        let params = BinaryParams {
            encode_header: false,
            large_element_size: true,
        };
        let bytes = archive.to_bytes(params).expect("encode");
        assert!(Archive::from_bytes(&bytes).is_err());
        assert_eq!(Archive::from_bytes_with(&bytes, params).expect("decode"), archive);
    }

    #[test]
    fn test_truncated_tree() {
        let bytes = sample().to_bytes(BinaryParams::default()).expect("encode");
        for cut in [5, bytes.len() / 2, bytes.len() - 1] {
            assert!(Archive::from_bytes(&bytes[..cut]).is_err(), "cut at {}", cut);
        }
    }

    #[test]
    fn test_rejects_value_without_name() {
        let raw = encode_property(
            &Property::Scalar(crate::core::Scalar::Int32(1)),
            &BinaryParams::HEADERLESS,
        )
        .expect("encode");
        let mut ser = Serializer::new(Vec::new(), BinaryParams::HEADERLESS).expect("new");
        ser.write_property(&raw).expect("write");
        assert!(matches!(
            Archive::from_bytes(&ser.into_inner()),
            Err(Error::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let mut archive = Archive::new();
        archive
            .root_mut()
            .insert_property("loop", Property::Object(Archive::ROOT))
            .expect("insert");
        assert!(archive.to_bytes(BinaryParams::default()).is_err());
    }
}
