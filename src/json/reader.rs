//! JSON to archive conversion.

use serde_json::{Map, Number, Value};

use crate::core::{ArchiveObjectMut, Array, Property, Scalar};
use crate::util::{Error, Result};

/// Populate `obj` from a JSON object.
///
/// Integers become `int64` (unsigned values past `i64::MAX` keep their bit
/// pattern), other numbers `float64`. Arrays take the type of their first
/// element; nested and mixed arrays are logged and skipped, as are nulls.
pub fn from_json(value: &Value, obj: &mut ArchiveObjectMut<'_>) -> Result<()> {
    match value {
        Value::Object(map) => read_object(map, obj),
        other => Err(Error::Unsupported(format!(
            "JSON root must be an object, got {}",
            kind(other)
        ))),
    }
}

fn read_object(map: &Map<String, Value>, obj: &mut ArchiveObjectMut<'_>) -> Result<()> {
    for (name, value) in map {
        match value {
            Value::Null => tracing::trace!(property = %name, "null skipped"),
            Value::Bool(b) => obj.insert_property(name, Property::Scalar(Scalar::Boolean(*b)))?,
            Value::Number(n) => obj.insert_property(name, Property::Scalar(number(n)))?,
            Value::String(s) => obj.insert_property(name, Property::NullTermString(s.clone()))?,
            Value::Object(child) => read_object(child, &mut obj.create_child(name)?)?,
            Value::Array(items) => read_array(name, items, obj)?,
        }
    }
    Ok(())
}

fn integer(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| n.as_u64().map(|u| u as i64))
}

fn number(n: &Number) -> Scalar {
    match integer(n) {
        Some(i) => Scalar::Int64(i),
        None => Scalar::Float64(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn read_array(name: &str, items: &[Value], obj: &mut ArchiveObjectMut<'_>) -> Result<()> {
    let Some(first) = items.first() else {
        return obj.insert_property(name, Property::Array(Array::Empty));
    };

    let first_kind = kind(first);
    if let Some(odd) = items.iter().find(|v| kind(v) != first_kind) {
        tracing::error!(
            property = name,
            "mixed {} and {} elements in array, property skipped",
            first_kind,
            kind(odd)
        );
        return Ok(());
    }

    let array = match first {
        Value::Object(_) => {
            let ids = obj.create_object_array(name, items.len())?;
            for (id, item) in ids.into_iter().zip(items) {
                if let (Some(mut child), Value::Object(map)) = (obj.object_mut(id), item) {
                    read_object(map, &mut child)?;
                }
            }
            return Ok(());
        }
        Value::String(_) => Array::Text(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        Value::Bool(_) => Array::Boolean(items.iter().filter_map(Value::as_bool).collect()),
        Value::Number(_) => {
            let numbers: Vec<&Number> = items
                .iter()
                .filter_map(|v| match v {
                    Value::Number(n) => Some(n),
                    _ => None,
                })
                .collect();
            let integers: Option<Vec<i64>> = numbers.iter().map(|n| integer(n)).collect();
            match integers {
                Some(v) => Array::Int64(v),
                None => Array::Float64(numbers.iter().filter_map(|n| n.as_f64()).collect()),
            }
        }
        Value::Array(_) => {
            tracing::error!(property = name, "nested arrays are not supported, property skipped");
            return Ok(());
        }
        Value::Null => {
            tracing::error!(property = name, "arrays of nulls are not supported, property skipped");
            return Ok(());
        }
    };
    obj.insert_property(name, Property::Array(array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Archive;
    use serde_json::json;

    fn load(value: Value) -> Archive {
        let mut archive = Archive::new();
        from_json(&value, &mut archive.root_mut()).expect("from_json");
        archive
    }

    #[test]
    fn test_scalars() {
        let archive = load(json!({
            "i": -4,
            "u": u64::MAX,
            "f": 1.25,
            "b": true,
            "s": "str",
            "n": null
        }));
        let root = archive.root();
        assert_eq!(root.get::<i64>("i"), Some(-4));
        assert_eq!(root.get::<u64>("u"), Some(u64::MAX));
        assert_eq!(root.get::<f64>("f"), Some(1.25));
        assert_eq!(root.get::<bool>("b"), Some(true));
        assert_eq!(root.get::<String>("s").as_deref(), Some("str"));
        assert!(!root.contains("n"));
    }

    #[test]
    fn test_arrays() {
        let archive = load(json!({
            "ints": [1, 2, 3],
            "floats": [1, 2.5],
            "names": ["x", "y"],
            "flags": [false, true],
            "empty": [],
            "objs": [{"a": 1}, {"b": {"c": "d"}}]
        }));
        let root = archive.root();
        assert_eq!(root.get::<Vec<i64>>("ints"), Some(vec![1, 2, 3]));
        assert_eq!(root.get::<Vec<f64>>("floats"), Some(vec![1.0, 2.5]));
        assert_eq!(
            root.get::<Vec<String>>("names"),
            Some(vec!["x".to_string(), "y".to_string()])
        );
        assert_eq!(root.get::<Vec<bool>>("flags"), Some(vec![false, true]));
        assert_eq!(
            root.find_property("empty"),
            Some(&Property::Array(Array::Empty))
        );

        let objs = root.get_objects("objs").expect("objects");
        assert_eq!(objs.len(), 2);
        assert_eq!(objs[0].get::<i64>("a"), Some(1));
        let nested = objs[1].get_object("b").expect("nested");
        assert_eq!(nested.get::<String>("c").as_deref(), Some("d"));
    }

    #[test]
    fn test_skips_unsupported_arrays() {
        let archive = load(json!({
            "nested": [[1], [2]],
            "mixed": [1, "a"],
            "nulls": [null],
            "kept": 1
        }));
        let root = archive.root();
        assert_eq!(root.len(), 1);
        assert!(root.contains("kept"));
    }

    #[test]
    fn test_root_must_be_object() {
        let mut archive = Archive::new();
        let err = from_json(&json!([1, 2]), &mut archive.root_mut()).expect_err("array root");
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
