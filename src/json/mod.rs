//! JSON bridge for archive trees.
//!
//! JSON documents mirror the tree: nested objects become nested JSON
//! objects and arrays of objects become arrays of JSON objects. Type widths
//! are not preserved; integers read back as `int64` and floats as `float64`.

mod reader;
mod writer;

pub use reader::from_json;
pub use writer::to_json;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{CompactFormatter, PrettyFormatter};
use serde_json::Value;

use crate::core::Archive;
use crate::util::{Error, Result};

/// Write `value` with `indent` spaces per level, compact when 0.
fn write_value<W: Write>(writer: W, value: &Value, indent: usize) -> Result<()> {
    if indent == 0 {
        let mut ser = serde_json::Serializer::with_formatter(writer, CompactFormatter);
        value.serialize(&mut ser)?;
    } else {
        let spaces = vec![b' '; indent];
        let mut ser =
            serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(&spaces));
        value.serialize(&mut ser)?;
    }
    Ok(())
}

/// Render the whole tree as JSON text.
pub fn to_json_string(archive: &Archive, indent: usize) -> Result<String> {
    let mut out = Vec::new();
    write_value(&mut out, &to_json(&archive.root()), indent)?;
    Ok(String::from_utf8(out)?)
}

/// Write the whole tree as JSON into `writer`.
pub fn dump_to<W: Write>(archive: &Archive, mut writer: W, indent: usize) -> Result<()> {
    write_value(&mut writer, &to_json(&archive.root()), indent)?;
    writer.flush()?;
    Ok(())
}

/// Write the whole tree as a JSON file.
///
/// The parent directory must already exist.
pub fn dump(archive: &Archive, path: impl AsRef<Path>, indent: usize) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            return Err(Error::FileNotFound(parent.to_path_buf()));
        }
    }
    dump_to(archive, BufWriter::new(File::create(path)?), indent)
}

/// Build a tree from an already parsed JSON object.
pub fn from_value(value: &Value) -> Result<Archive> {
    let mut archive = Archive::new();
    from_json(value, &mut archive.root_mut())?;
    Ok(archive)
}

/// Parse JSON text into a tree.
pub fn from_json_str(text: &str) -> Result<Archive> {
    from_value(&serde_json::from_str(text)?)
}

/// Parse JSON from `reader` into a tree.
pub fn read_from<R: Read>(reader: R) -> Result<Archive> {
    from_value(&serde_json::from_reader(reader)?)
}

/// Parse a JSON file into a tree.
pub fn read(path: impl AsRef<Path>) -> Result<Archive> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    read_from(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent() {
        let mut archive = Archive::new();
        archive.root_mut().set_property("a", &1i32).expect("set");

        assert_eq!(to_json_string(&archive, 0).expect("compact"), r#"{"a":1}"#);
        assert_eq!(
            to_json_string(&archive, 2).expect("pretty"),
            "{\n  \"a\": 1\n}"
        );
    }

    #[test]
    fn test_from_json_str() {
        let archive = from_json_str(r#"{"name": "x", "list": [1, 2]}"#).expect("parse");
        let root = archive.root();
        assert_eq!(root.get::<String>("name").as_deref(), Some("x"));
        assert_eq!(root.get::<Vec<i64>>("list"), Some(vec![1, 2]));

        assert!(matches!(from_json_str("{"), Err(Error::Json(_))));
        assert!(matches!(from_json_str("3"), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_dump_requires_directory() {
        let archive = Archive::new();
        let err = dump(&archive, "/nonexistent-dir/for/sure/out.json", 2).expect_err("missing dir");
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
