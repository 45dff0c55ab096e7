//! Typed values over flat record streams.
//!
//! [`Serializer::add_value`] writes one value as one or more records and
//! [`Deserializer::get_value`] reads it back in the same order. Records carry
//! no names, so the reader must ask for the types the writer wrote.
//!
//! | Rust value                            | Records                          |
//! |---------------------------------------|----------------------------------|
//! | numbers, `bool`                       | one scalar                       |
//! | `str`, `String`                       | one null terminated string       |
//! | `[T; 1..=4]`, glam vectors            | one `vecN`                       |
//! | `[T; N]` otherwise, `Vec<T>`          | one array                        |
//! | `HashMap`, `BTreeMap`                 | u64 count, then key value pairs  |
//! | `(F, S)`                              | first, then second               |
//! | sequences of user types               | u64 count, then each item        |

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::io::Write;

use super::codec::{decode_property, encode_property};
use super::reader::Deserializer;
use super::writer::Serializer;
use crate::core::{Array, Element, Property, Scalar};
use crate::util::{ContainerType, Error, Result};

/// Values that write themselves to a record stream.
pub trait Serializable {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()>;
}

/// Values that read themselves back from a record stream.
pub trait Deserializable: Sized {
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self>;
}

impl<W: Write> Serializer<W> {
    /// Write `value` as the next record(s).
    pub fn add_value<T: Serializable + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    /// Write a count followed by every item.
    pub fn add_sequence<T: Serializable>(&mut self, items: &[T]) -> Result<()> {
        self.add_value(&(items.len() as u64))?;
        items.iter().try_for_each(|item| item.serialize(self))
    }

    fn add_leaf(&mut self, property: &Property) -> Result<()> {
        let raw = encode_property(property, &self.params())?;
        self.write_property(&raw)
    }
}

impl<'a> Deserializer<'a> {
    /// Read the next value; the end of the buffer is an error.
    pub fn get_value<T: Deserializable>(&mut self) -> Result<T> {
        T::deserialize(self)
    }

    /// Read a sequence written by [`Serializer::add_sequence`].
    pub fn get_sequence<T: Deserializable>(&mut self) -> Result<Vec<T>> {
        let count = self.get_count()?;
        (0..count).map(|_| T::deserialize(self)).collect()
    }

    fn get_leaf(&mut self) -> Result<(usize, Property)> {
        let at = self.offset();
        let raw = self.next_property()?.ok_or(Error::UnexpectedEof(at))?;
        Ok((at, decode_property(&raw, &self.params())?))
    }

    /// A u64 count, bounded by the records the buffer can still hold.
    fn get_count(&mut self) -> Result<usize> {
        let at = self.offset();
        let count: u64 = self.get_value()?;
        let count = usize::try_from(count).map_err(|_| Error::UnexpectedEof(at))?;
        // Every record takes at least its two tag bytes.
        if count.saturating_mul(2) > self.remaining() {
            return Err(Error::UnexpectedEof(self.offset()));
        }
        Ok(count)
    }
}

fn record_name(at: usize) -> String {
    format!("record at {}", at)
}

fn expected<T: Element>(container: ContainerType) -> String {
    format!("{}/{}", T::PROPERTY_TYPE, container)
}

// ============================================================================
// Leaves
// ============================================================================

macro_rules! impl_stream_numeric {
    ($($t:ty),* $(,)?) => {$(
        impl Serializable for $t {
            fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
                ser.add_leaf(&Property::Scalar(self.into_scalar()))
            }
        }

        impl Deserializable for $t {
            fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
                let (at, property) = de.get_leaf()?;
                let value = match &property {
                    Property::Scalar(scalar) => <$t>::from_scalar(scalar),
                    _ => None,
                };
                value.ok_or_else(|| {
                    Error::mismatch(
                        record_name(at),
                        expected::<$t>(ContainerType::Scalar),
                        property.describe(),
                    )
                })
            }
        }
    )*};
}

impl_stream_numeric!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64);

impl Serializable for bool {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        ser.add_leaf(&Property::Scalar(Scalar::Boolean(*self)))
    }
}

impl Deserializable for bool {
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        match de.get_leaf()? {
            (_, Property::Scalar(Scalar::Boolean(v))) => Ok(v),
            (at, other) => Err(Error::mismatch(record_name(at), "boolean/scalar", other.describe())),
        }
    }
}

impl Serializable for str {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        ser.add_leaf(&Property::NullTermString(self.to_string()))
    }
}

impl Serializable for String {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        self.as_str().serialize(ser)
    }
}

impl Deserializable for String {
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        match de.get_leaf()? {
            (_, Property::NullTermString(text)) => Ok(text),
            (_, Property::String(bytes)) => Ok(String::from_utf8(bytes)?),
            (at, other) => Err(Error::mismatch(
                record_name(at),
                "character/null_term_string",
                other.describe(),
            )),
        }
    }
}

// ============================================================================
// Vectors and arrays
// ============================================================================

fn add_fixed<W: Write, T: Element>(ser: &mut Serializer<W>, values: &[T]) -> Result<()> {
    let array = T::into_array(values.to_vec());
    let property = match ContainerType::vector(values.len()) {
        Some(_) => Property::Vector(array),
        None => Property::Array(array),
    };
    ser.add_leaf(&property)
}

fn get_fixed<T: Element, const N: usize>(de: &mut Deserializer<'_>) -> Result<[T; N]> {
    let (at, property) = de.get_leaf()?;
    let container = ContainerType::vector(N).unwrap_or(ContainerType::Array);
    let values = match (container, &property) {
        (ContainerType::Array, Property::Array(array)) => T::from_array(array),
        (ContainerType::Array, _) => None,
        (_, Property::Vector(array)) => T::from_array(array),
        _ => None,
    };
    values
        .and_then(|values| <[T; N]>::try_from(values).ok())
        .ok_or_else(|| Error::mismatch(record_name(at), expected::<T>(container), property.describe()))
}

impl<T: Element, const N: usize> Serializable for [T; N] {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        add_fixed(ser, self)
    }
}

impl<T: Element, const N: usize> Deserializable for [T; N] {
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        get_fixed(de)
    }
}

macro_rules! impl_stream_glam {
    ($($t:ty => [$e:ty; $n:literal]),* $(,)?) => {$(
        impl Serializable for $t {
            fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
                add_fixed(ser, &self.to_array())
            }
        }

        impl Deserializable for $t {
            fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
                Ok(<$t>::from_array(get_fixed::<$e, $n>(de)?))
            }
        }
    )*};
}

impl_stream_glam!(
    glam::Vec2 => [f32; 2],
    glam::Vec3 => [f32; 3],
    glam::Vec4 => [f32; 4],
    glam::DVec2 => [f64; 2],
    glam::DVec3 => [f64; 3],
    glam::DVec4 => [f64; 4],
    glam::IVec2 => [i32; 2],
    glam::IVec3 => [i32; 3],
    glam::IVec4 => [i32; 4],
    glam::UVec2 => [u32; 2],
    glam::UVec3 => [u32; 3],
    glam::UVec4 => [u32; 4],
);

impl<T: Element> Serializable for [T] {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        ser.add_leaf(&Property::Array(T::into_array(self.to_vec())))
    }
}

impl<T: Element> Serializable for Vec<T> {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        self.as_slice().serialize(ser)
    }
}

impl<T: Element> Deserializable for Vec<T> {
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let (at, property) = de.get_leaf()?;
        let values = match &property {
            Property::Array(array) => T::from_array(array),
            _ => None,
        };
        values.ok_or_else(|| {
            Error::mismatch(record_name(at), expected::<T>(ContainerType::Array), property.describe())
        })
    }
}

impl Serializable for Vec<bool> {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        ser.add_leaf(&Property::Array(Array::Boolean(self.clone())))
    }
}

impl Deserializable for Vec<bool> {
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        match de.get_leaf()? {
            (_, Property::Array(Array::Boolean(v))) => Ok(v),
            (_, Property::Array(Array::Empty)) => Ok(Vec::new()),
            (at, other) => Err(Error::mismatch(record_name(at), "boolean/array", other.describe())),
        }
    }
}

impl Serializable for Vec<String> {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        ser.add_leaf(&Property::Array(Array::Text(self.clone())))
    }
}

impl Deserializable for Vec<String> {
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        match de.get_leaf()? {
            (_, Property::Array(Array::Text(v))) => Ok(v),
            (_, Property::Array(Array::Empty)) => Ok(Vec::new()),
            (at, other) => Err(Error::mismatch(
                record_name(at),
                "null_term_string/array",
                other.describe(),
            )),
        }
    }
}

// ============================================================================
// Maps and pairs
// ============================================================================

fn add_entries<'e, W, K, V>(
    ser: &mut Serializer<W>,
    len: usize,
    entries: impl Iterator<Item = (&'e K, &'e V)>,
) -> Result<()>
where
    W: Write,
    K: Serializable + 'e,
    V: Serializable + 'e,
{
    ser.add_value(&(len as u64))?;
    for (key, value) in entries {
        key.serialize(ser)?;
        value.serialize(ser)?;
    }
    Ok(())
}

fn get_entries<K: Deserializable, V: Deserializable>(de: &mut Deserializer<'_>) -> Result<Vec<(K, V)>> {
    let count = de.get_count()?;
    (0..count)
        .map(|_| Ok((K::deserialize(de)?, V::deserialize(de)?)))
        .collect()
}

impl<K: Serializable, V: Serializable, S> Serializable for HashMap<K, V, S> {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        add_entries(ser, self.len(), self.iter())
    }
}

impl<K, V, S> Deserializable for HashMap<K, V, S>
where
    K: Deserializable + Eq + Hash,
    V: Deserializable,
    S: BuildHasher + Default,
{
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        Ok(get_entries(de)?.into_iter().collect())
    }
}

impl<K: Serializable, V: Serializable> Serializable for BTreeMap<K, V> {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        add_entries(ser, self.len(), self.iter())
    }
}

impl<K: Deserializable + Ord, V: Deserializable> Deserializable for BTreeMap<K, V> {
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        Ok(get_entries(de)?.into_iter().collect())
    }
}

impl<F: Serializable, S: Serializable> Serializable for (F, S) {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        self.0.serialize(ser)?;
        self.1.serialize(ser)
    }
}

impl<F: Deserializable, S: Deserializable> Deserializable for (F, S) {
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        Ok((F::deserialize(de)?, S::deserialize(de)?))
    }
}

impl<T: Serializable + ?Sized> Serializable for &T {
    fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        (**self).serialize(ser)
    }
}
