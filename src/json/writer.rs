//! Archive to JSON conversion.

use serde_json::{Map, Number, Value};

use crate::core::{Archive, ArchiveObject, Array, Property, Scalar};

/// Convert an object and everything below it into a JSON object.
///
/// Values JSON cannot hold (`vecN`, 128-bit integers, NaN and infinite
/// floats) are logged and left out.
pub fn to_json(obj: &ArchiveObject<'_>) -> Value {
    let mut map = Map::with_capacity(obj.len());
    for (name, property) in obj.iter() {
        if let Some(value) = property_to_json(obj.archive(), name, property) {
            map.insert(name.to_string(), value);
        }
    }
    Value::Object(map)
}

fn property_to_json(archive: &Archive, name: &str, property: &Property) -> Option<Value> {
    match property {
        Property::Scalar(scalar) => scalar_to_json(name, scalar),
        Property::Vector(array) => {
            tracing::error!(
                property = name,
                "cannot write vec{} to JSON, property skipped",
                array.len()
            );
            None
        }
        Property::Array(array) => array_to_json(archive, name, array),
        Property::String(bytes) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
        Property::NullTermString(text) => Some(Value::String(text.clone())),
        Property::Object(id) => match archive.object(*id) {
            Some(child) => Some(to_json(&child)),
            None => {
                tracing::error!(property = name, "dangling object handle {}", id);
                None
            }
        },
    }
}

fn scalar_to_json(name: &str, scalar: &Scalar) -> Option<Value> {
    let value = match *scalar {
        Scalar::Int8(v) => Value::from(v),
        Scalar::Int16(v) => Value::from(v),
        Scalar::Int32(v) => Value::from(v),
        Scalar::Int64(v) => Value::from(v),
        Scalar::Int128(_) => {
            tracing::error!(property = name, "cannot write int128 to JSON, property skipped");
            return None;
        }
        Scalar::Float32(v) => return float(name, v as f64),
        Scalar::Float64(v) => return float(name, v),
        Scalar::Character(c) => Value::String(char::from(c).to_string()),
        Scalar::Boolean(v) => Value::Bool(v),
    };
    Some(value)
}

fn float(name: &str, v: f64) -> Option<Value> {
    match Number::from_f64(v) {
        Some(n) => Some(Value::Number(n)),
        None => {
            tracing::error!(property = name, "cannot write {} to JSON, property skipped", v);
            None
        }
    }
}

fn floats<T: Copy + Into<f64>>(name: &str, values: &[T]) -> Option<Value> {
    values
        .iter()
        .map(|v| Number::from_f64((*v).into()).map(Value::Number))
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
        .or_else(|| {
            tracing::error!(
                property = name,
                "cannot write non-finite floats to JSON, property skipped"
            );
            None
        })
}

fn array_to_json(archive: &Archive, name: &str, array: &Array) -> Option<Value> {
    fn numbers<T: Copy + Into<Value>>(values: &[T]) -> Value {
        Value::Array(values.iter().map(|v| (*v).into()).collect())
    }

    let value = match array {
        Array::Empty => Value::Array(Vec::new()),
        Array::Binary(v) => numbers(v),
        Array::Int8(v) => numbers(v),
        Array::Int16(v) => numbers(v),
        Array::Int32(v) => numbers(v),
        Array::Int64(v) => numbers(v),
        Array::Int128(_) => {
            tracing::error!(property = name, "cannot write int128 arrays to JSON, property skipped");
            return None;
        }
        Array::Float32(v) => return floats(name, v),
        Array::Float64(v) => return floats(name, v),
        Array::Character(v) => Value::Array(
            v.iter()
                .map(|c| Value::String(char::from(*c).to_string()))
                .collect(),
        ),
        Array::Boolean(v) => numbers(v),
        Array::Text(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
        Array::Object(ids) => Value::Array(
            ids.iter()
                .filter_map(|id| archive.object(*id))
                .map(|child| to_json(&child))
                .collect(),
        ),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_and_strings() {
        let mut archive = Archive::new();
        let mut root = archive.root_mut();
        root.set_property("i", &-3i16).expect("set");
        root.set_property("f", &0.5f64).expect("set");
        root.set_property("b", &false).expect("set");
        root.set_property("s", "text").expect("set");
        root.insert_property("c", Property::Scalar(Scalar::Character(b'x')))
            .expect("insert");

        assert_eq!(
            to_json(&archive.root()),
            json!({"i": -3, "f": 0.5, "b": false, "s": "text", "c": "x"})
        );
    }

    #[test]
    fn test_skips_unrepresentable() {
        let mut archive = Archive::new();
        let mut root = archive.root_mut();
        root.set_property("v", &[1.0f32, 2.0, 3.0]).expect("set");
        root.set_property("big", &1i128).expect("set");
        root.set_property("wide", &vec![1u128]).expect("set");
        root.set_property("kept", &1i32).expect("set");

        assert_eq!(to_json(&archive.root()), json!({"kept": 1}));
    }

    #[test]
    fn test_skips_non_finite_floats() {
        let mut archive = Archive::new();
        let mut root = archive.root_mut();
        root.set_property("nan", &f64::NAN).expect("set");
        root.set_property("inf", &f32::INFINITY).expect("set");
        root.set_property("bad_list", &vec![1.0f64, f64::NEG_INFINITY]).expect("set");
        root.set_property("ratio", &0.25f32).expect("set");
        root.set_property("list", &vec![0.5f32, 2.0]).expect("set");

        assert_eq!(
            to_json(&archive.root()),
            json!({"ratio": 0.25, "list": [0.5, 2.0]})
        );
    }

    #[test]
    fn test_nested_and_arrays() {
        let mut archive = Archive::new();
        let mut root = archive.root_mut();
        root.child("n").expect("child").set_property("x", &1i64).expect("set");
        root.set_property("nums", &vec![1u8, 2]).expect("set");
        root.set_property("flags", &vec![true]).expect("set");
        root.set_property("names", &vec!["a", "b"]).expect("set");
        root.set_binary_block("blob", &[0, 255]).expect("set");
        let ids = root.create_object_array("objs", 2).expect("array");
        root.object_mut(ids[1])
            .expect("node")
            .set_property("k", "v")
            .expect("set");

        assert_eq!(
            to_json(&archive.root()),
            json!({
                "n": {"x": 1},
                "nums": [1, 2],
                "flags": [true],
                "names": ["a", "b"],
                "blob": [0, 255],
                "objs": [{}, {"k": "v"}]
            })
        );
    }
}
