//! Conversion between leaf [`Property`] values and wire records.
//!
//! Nested objects are not leaves; they are framed by the tree codec.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::format::{self, BinaryParams};
use super::record::RawProperty;
use crate::core::{Array, Property, Scalar};
use crate::util::{ContainerType, Error, PropertyType, Result};

// ============================================================================
// Encoding
// ============================================================================

/// Encode a leaf property into an owned record.
pub fn encode_property(property: &Property, params: &BinaryParams) -> Result<RawProperty<'static>> {
    let raw = match property {
        Property::Scalar(scalar) => {
            let mut payload = Vec::with_capacity(16);
            encode_scalar(scalar, &mut payload)?;
            RawProperty::new(scalar.property_type(), ContainerType::Scalar, 1, payload)
        }
        Property::Vector(array) => {
            let container_type = ContainerType::vector(array.len())
                .filter(|_| array.is_numeric())
                .ok_or_else(|| Error::invalid(format!("{} elements cannot form a vector", array.len())))?;
            RawProperty::new(
                array.property_type(),
                container_type,
                array.len(),
                encode_array(array, params)?,
            )
        }
        Property::Array(array) => RawProperty::new(
            array.property_type(),
            ContainerType::Array,
            array.len(),
            encode_array(array, params)?,
        ),
        Property::String(bytes) => RawProperty::new(
            PropertyType::Character,
            ContainerType::String,
            bytes.len(),
            bytes.clone(),
        ),
        Property::NullTermString(text) => RawProperty::text(text),
        Property::Object(_) => {
            return Err(Error::Unsupported(
                "nested objects are encoded by the tree codec".into(),
            ))
        }
    };
    Ok(raw)
}

fn encode_scalar(scalar: &Scalar, out: &mut Vec<u8>) -> Result<()> {
    match *scalar {
        Scalar::Int8(v) => out.write_i8(v)?,
        Scalar::Int16(v) => out.write_i16::<LittleEndian>(v)?,
        Scalar::Int32(v) => out.write_i32::<LittleEndian>(v)?,
        Scalar::Int64(v) => out.write_i64::<LittleEndian>(v)?,
        Scalar::Int128(v) => out.write_i128::<LittleEndian>(v)?,
        Scalar::Float32(v) => out.write_f32::<LittleEndian>(v)?,
        Scalar::Float64(v) => out.write_f64::<LittleEndian>(v)?,
        Scalar::Character(v) => out.write_u8(v)?,
        Scalar::Boolean(v) => out.write_u8(v as u8)?,
    }
    Ok(())
}

/// Element run of an array; strings are framed per element.
fn encode_array(array: &Array, params: &BinaryParams) -> Result<Vec<u8>> {
    let width = array.property_type().byte_width();
    let mut out = Vec::with_capacity(array.len() * width.max(1));
    match array {
        Array::Empty => {}
        Array::Binary(v) | Array::Character(v) => out.extend_from_slice(v),
        Array::Int8(v) => out.extend(v.iter().map(|x| *x as u8)),
        Array::Int16(v) => v.iter().try_for_each(|x| out.write_i16::<LittleEndian>(*x))?,
        Array::Int32(v) => v.iter().try_for_each(|x| out.write_i32::<LittleEndian>(*x))?,
        Array::Int64(v) => v.iter().try_for_each(|x| out.write_i64::<LittleEndian>(*x))?,
        Array::Int128(v) => v.iter().try_for_each(|x| out.write_i128::<LittleEndian>(*x))?,
        Array::Float32(v) => v.iter().try_for_each(|x| out.write_f32::<LittleEndian>(*x))?,
        Array::Float64(v) => v.iter().try_for_each(|x| out.write_f64::<LittleEndian>(*x))?,
        Array::Boolean(v) => out.extend(v.iter().map(|b| *b as u8)),
        Array::Text(v) => {
            for text in v {
                format::write_count(&mut out, text.len() + 1, params)?;
                out.extend_from_slice(text.as_bytes());
                out.push(0);
            }
        }
        Array::Object(_) => {
            return Err(Error::Unsupported(
                "arrays of objects are encoded by the tree codec".into(),
            ))
        }
    }
    Ok(out)
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a leaf record into an owned property.
pub fn decode_property(raw: &RawProperty<'_>, params: &BinaryParams) -> Result<Property> {
    let payload = raw.payload();
    let count = raw.elements_number;

    if let Some(implied) = format::implied_count(raw.container_type) {
        if implied != count {
            return Err(Error::invalid(format!(
                "{} container holds {} elements, got {}",
                raw.container_type, implied, count
            )));
        }
    }
    if let Some(expected) = format::fixed_payload_len(raw.property_type, raw.container_type, count) {
        if expected != payload.len() {
            return Err(Error::invalid(format!(
                "{}/{} record with {} elements has {} payload bytes, expected {}",
                raw.property_type,
                raw.container_type,
                count,
                payload.len(),
                expected
            )));
        }
    }

    match raw.container_type {
        ContainerType::Scalar => {
            let array = decode_array(raw.property_type, 1, payload, params)?;
            array.scalar_at(0).map(Property::Scalar).ok_or_else(|| {
                Error::invalid(format!("{} is not a scalar type", raw.property_type))
            })
        }
        ContainerType::Vec1 | ContainerType::Vec2 | ContainerType::Vec3 | ContainerType::Vec4 => {
            let array = decode_array(raw.property_type, count, payload, params)?;
            Property::vector(array).ok_or_else(|| {
                Error::invalid(format!("{} cannot form a vector", raw.property_type))
            })
        }
        ContainerType::Array => Ok(Property::Array(decode_array(
            raw.property_type,
            count,
            payload,
            params,
        )?)),
        ContainerType::String => Ok(Property::String(payload.to_vec())),
        ContainerType::NullTermString => {
            // An empty record is tolerated as an empty string.
            let text = match payload.split_last() {
                None => payload,
                Some((0, text)) => text,
                Some(_) => return Err(Error::invalid("null terminated string without terminator")),
            };
            Ok(Property::NullTermString(String::from_utf8(text.to_vec())?))
        }
        ContainerType::Object => Err(Error::Unsupported(
            "nested objects are decoded by the tree codec".into(),
        )),
    }
}

fn decode_array(
    property_type: PropertyType,
    count: usize,
    payload: &[u8],
    params: &BinaryParams,
) -> Result<Array> {
    let array = match property_type {
        PropertyType::Invalid if count == 0 => Array::Empty,
        PropertyType::Binary => Array::Binary(payload.to_vec()),
        PropertyType::Character => Array::Character(payload.to_vec()),
        PropertyType::Int8 => Array::Int8(payload.iter().map(|b| *b as i8).collect()),
        PropertyType::Boolean => Array::Boolean(payload.iter().map(|b| *b != 0).collect()),
        PropertyType::Int16 => {
            let mut v = vec![0i16; count];
            LittleEndian::read_i16_into(payload, &mut v);
            Array::Int16(v)
        }
        PropertyType::Int32 => {
            let mut v = vec![0i32; count];
            LittleEndian::read_i32_into(payload, &mut v);
            Array::Int32(v)
        }
        PropertyType::Int64 => {
            let mut v = vec![0i64; count];
            LittleEndian::read_i64_into(payload, &mut v);
            Array::Int64(v)
        }
        PropertyType::Int128 => {
            let mut v = vec![0i128; count];
            LittleEndian::read_i128_into(payload, &mut v);
            Array::Int128(v)
        }
        PropertyType::Float32 => {
            let mut v = vec![0f32; count];
            LittleEndian::read_f32_into(payload, &mut v);
            Array::Float32(v)
        }
        PropertyType::Float64 => {
            let mut v = vec![0f64; count];
            LittleEndian::read_f64_into(payload, &mut v);
            Array::Float64(v)
        }
        PropertyType::NullTermString => Array::Text(decode_text_elements(count, payload, params)?),
        other => {
            return Err(Error::invalid(format!(
                "{} elements of type {} cannot be decoded",
                count, other
            )))
        }
    };
    Ok(array)
}

fn decode_text_elements(count: usize, mut payload: &[u8], params: &BinaryParams) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(count.min(payload.len()));
    for _ in 0..count {
        let len = format::read_count(&mut payload, params)?;
        if len > payload.len() {
            return Err(Error::UnexpectedEof(payload.len()));
        }
        let (element, rest) = payload.split_at(len);
        payload = rest;
        let element = element.strip_suffix(&[0u8]).unwrap_or(element);
        out.push(String::from_utf8(element.to_vec())?);
    }
    if !payload.is_empty() {
        return Err(Error::invalid(format!(
            "{} trailing bytes after string array",
            payload.len()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(property: Property) {
        let params = BinaryParams::default();
        let raw = encode_property(&property, &params).expect("encode");
        assert_eq!(raw.property_type, property.property_type());
        assert_eq!(raw.container_type, property.container_type());
        assert_eq!(decode_property(&raw, &params).expect("decode"), property);
    }

    #[test]
    fn test_scalars() {
        round_trip(Property::Scalar(Scalar::Int8(i8::MIN)));
        round_trip(Property::Scalar(Scalar::Int8(i8::MAX)));
        round_trip(Property::Scalar(Scalar::Int64(i64::MIN)));
        round_trip(Property::Scalar(Scalar::Int64(i64::MAX)));
        round_trip(Property::Scalar(Scalar::Int128(-1)));
        round_trip(Property::Scalar(Scalar::Float32(0.0)));
        round_trip(Property::Scalar(Scalar::Float64(-2.5)));
        round_trip(Property::Scalar(Scalar::Boolean(true)));
        round_trip(Property::Scalar(Scalar::Character(b'x')));
    }

    #[test]
    fn test_int32_layout() {
        let raw = encode_property(&Property::Scalar(Scalar::Int32(5)), &BinaryParams::default())
            .expect("encode");
        assert_eq!(raw.payload(), &[5, 0, 0, 0]);
    }

    #[test]
    fn test_arrays_and_strings() {
        round_trip(Property::Array(Array::Int32(vec![1, 2, 3])));
        round_trip(Property::Array(Array::Int16(vec![])));
        round_trip(Property::Array(Array::Empty));
        round_trip(Property::Array(Array::Boolean(vec![true, false, true])));
        round_trip(Property::Array(Array::Binary(vec![0, 255, 7])));
        round_trip(Property::Array(Array::Text(vec!["".into(), "ab".into()])));
        round_trip(Property::NullTermString(String::new()));
        round_trip(Property::NullTermString("hello".into()));
        round_trip(Property::String(b"raw bytes".to_vec()));
    }

    #[test]
    fn test_vectors() {
        for n in 1..=4 {
            let property = Property::vector(Array::Float64(vec![1.5; n])).expect("vector");
            let raw = encode_property(&property, &BinaryParams::default()).expect("encode");
            assert_eq!(raw.container_type.vector_arity(), Some(n));
            assert_eq!(raw.payload().len(), n * 8);
            round_trip(property);
        }
    }

    #[test]
    fn test_objects_are_not_leaves() {
        let params = BinaryParams::default();
        let object = Property::Object(crate::core::Archive::ROOT);
        assert!(matches!(encode_property(&object, &params), Err(Error::Unsupported(_))));

        let raw = RawProperty::new(PropertyType::Object, ContainerType::Object, 0, Vec::new());
        assert!(matches!(decode_property(&raw, &params), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_decode_rejects_bad_payload() {
        let params = BinaryParams::default();
        let raw = RawProperty::new(PropertyType::Int32, ContainerType::Array, 2, vec![0u8; 5]);
        assert!(matches!(decode_property(&raw, &params), Err(Error::InvalidStructure(_))));

        let raw = RawProperty::new(PropertyType::Binary, ContainerType::Scalar, 1, vec![0u8]);
        assert!(decode_property(&raw, &params).is_err());

        let raw = RawProperty::new(
            PropertyType::Character,
            ContainerType::NullTermString,
            2,
            b"ab".to_vec(),
        );
        assert!(decode_property(&raw, &params).is_err());
    }
}
