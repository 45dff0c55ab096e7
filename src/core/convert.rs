//! Typed conversion between Rust values and archive properties.
//!
//! [`ToProperty`] and [`FromProperty`] are implemented for:
//! - primitive numbers and `bool` (scalars)
//! - `[T; N]` (`vecN` for N in 1..=4, arrays otherwise) and glam vectors
//! - `Vec<T>`, slices and `SmallVec<[T; N]>` of numbers, booleans and strings
//! - string types: `str`, `String`, `Box<str>`, `Cow<str>`, `CStr`, `CString`,
//!   `Path`, `PathBuf`, [`SmallString`]
//! - maps (`HashMap`, `BTreeMap`) and pairs, stored as nested objects
//!
//! Maps become a child object with entries `k0, v0, k1, v1, ...`; pairs
//! become a child object with entries `f` and `s`.

use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::ffi::{CStr, CString};
use std::hash::Hash;
use std::path::{Path, PathBuf};

use super::element::Element;
use super::object::{index_name, ArchiveObject, ArchiveObjectMut};
use super::property::{Array, Property, Scalar};
use crate::util::{ContainerType, Error, PropertyType, Result, SmallString};

/// Values that can be written into an archive object.
pub trait ToProperty {
    /// Store `self` under `name`, replacing a property of the same type.
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()>;
}

/// Values that can be read back from an archive object.
pub trait FromProperty: Sized {
    /// `Ok(None)` if `name` is absent, `Err(TypeMismatch)` if it holds
    /// a different shape.
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>>;
}

impl<T: ToProperty + ?Sized> ToProperty for &T {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        (**self).write_property(obj, name)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn expected<T: Element>(container: ContainerType) -> String {
    format!("{}/{}", T::PROPERTY_TYPE, container)
}

fn read_scalar<T: Element>(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<T>> {
    let Some(property) = obj.find_property(name) else {
        return Ok(None);
    };
    let value = match property {
        Property::Scalar(scalar) => T::from_scalar(scalar),
        _ => None,
    };
    value
        .map(Some)
        .ok_or_else(|| Error::mismatch(name, expected::<T>(ContainerType::Scalar), property.describe()))
}

/// Elements of an array property. Vectors are a different shape.
fn read_array<T: Element>(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Vec<T>>> {
    let Some(property) = obj.find_property(name) else {
        return Ok(None);
    };
    let values = match property {
        Property::Array(array) => T::from_array(array),
        _ => None,
    };
    values
        .map(Some)
        .ok_or_else(|| Error::mismatch(name, expected::<T>(ContainerType::Array), property.describe()))
}

/// `N` elements stored the way [`write_fixed`] stores them: `vecN` for
/// N in 1..=4, an array otherwise.
fn read_fixed<T: Element, const N: usize>(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<[T; N]>> {
    let Some(property) = obj.find_property(name) else {
        return Ok(None);
    };
    let container = ContainerType::vector(N).unwrap_or(ContainerType::Array);
    let values = match (container, property) {
        (ContainerType::Array, Property::Array(array)) => T::from_array(array),
        (ContainerType::Array, _) => None,
        (_, Property::Vector(array)) => T::from_array(array),
        _ => None,
    };
    let values = values.ok_or_else(|| Error::mismatch(name, expected::<T>(container), property.describe()))?;
    <[T; N]>::try_from(values).map(Some).map_err(|values| {
        Error::mismatch(
            name,
            expected::<T>(container),
            format!("{} elements", values.len()),
        )
    })
}

fn write_fixed<T: Element>(obj: &mut ArchiveObjectMut<'_>, name: &str, values: &[T]) -> Result<()> {
    let array = T::into_array(values.to_vec());
    let property = match ContainerType::vector(values.len()) {
        Some(_) => Property::Vector(array),
        None => Property::Array(array),
    };
    obj.insert_property(name, property)
}

fn write_text(obj: &mut ArchiveObjectMut<'_>, name: &str, text: &str) -> Result<()> {
    obj.insert_property(name, Property::NullTermString(text.to_string()))
}

fn read_text(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<String>> {
    match obj.find_property(name) {
        None => Ok(None),
        Some(Property::NullTermString(text)) => Ok(Some(text.clone())),
        Some(Property::String(bytes)) => Ok(Some(String::from_utf8(bytes.clone())?)),
        Some(other) => Err(Error::mismatch(
            name,
            format!("{}/{}", PropertyType::Character, ContainerType::NullTermString),
            other.describe(),
        )),
    }
}

fn path_text(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::Unsupported(format!("non UTF-8 path {}", path.display())))
}

fn c_text(text: &CStr) -> Result<&str> {
    text.to_str().map_err(|e| Error::invalid(format!("C string is not UTF-8: {}", e)))
}

// ============================================================================
// Numbers
// ============================================================================

macro_rules! impl_numeric {
    ($($t:ty),* $(,)?) => {$(
        impl ToProperty for $t {
            fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
                obj.insert_property(name, Property::Scalar(self.into_scalar()))
            }
        }

        impl FromProperty for $t {
            fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
                read_scalar::<$t>(obj, name)
            }
        }
    )*};
}

impl_numeric!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64);

impl ToProperty for bool {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        obj.insert_property(name, Property::Scalar(Scalar::Boolean(*self)))
    }
}

impl FromProperty for bool {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        match obj.find_property(name) {
            None => Ok(None),
            Some(Property::Scalar(Scalar::Boolean(v))) => Ok(Some(*v)),
            Some(other) => Err(Error::mismatch(name, "boolean/scalar", other.describe())),
        }
    }
}

// ============================================================================
// Fixed size tuples
// ============================================================================

impl<T: Element, const N: usize> ToProperty for [T; N] {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        write_fixed(obj, name, self)
    }
}

impl<T: Element, const N: usize> FromProperty for [T; N] {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        read_fixed(obj, name)
    }
}

macro_rules! impl_glam {
    ($($t:ty => [$e:ty; $n:literal]),* $(,)?) => {$(
        impl ToProperty for $t {
            fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
                write_fixed(obj, name, &self.to_array())
            }
        }

        impl FromProperty for $t {
            fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
                Ok(read_fixed::<$e, $n>(obj, name)?.map(<$t>::from_array))
            }
        }
    )*};
}

impl_glam!(
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

// ============================================================================
// Sequences
// ============================================================================

impl<T: Element> ToProperty for [T] {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        obj.insert_property(name, Property::Array(T::into_array(self.to_vec())))
    }
}

impl<T: Element> ToProperty for Vec<T> {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        self.as_slice().write_property(obj, name)
    }
}

impl<T: Element> FromProperty for Vec<T> {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        read_array(obj, name)
    }
}

impl<T: Element, const N: usize> ToProperty for SmallVec<[T; N]> {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        self.as_slice().write_property(obj, name)
    }
}

impl<T: Element, const N: usize> FromProperty for SmallVec<[T; N]> {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        Ok(read_array::<T>(obj, name)?.map(SmallVec::from_vec))
    }
}

impl ToProperty for [bool] {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        obj.insert_property(name, Property::Array(Array::Boolean(self.to_vec())))
    }
}

impl ToProperty for Vec<bool> {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        self.as_slice().write_property(obj, name)
    }
}

impl FromProperty for Vec<bool> {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        match obj.find_property(name) {
            None => Ok(None),
            Some(Property::Array(Array::Boolean(v))) => Ok(Some(v.clone())),
            Some(Property::Array(Array::Empty)) => Ok(Some(Vec::new())),
            Some(other) => Err(Error::mismatch(name, "boolean/array", other.describe())),
        }
    }
}

impl ToProperty for [String] {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        obj.insert_property(name, Property::Array(Array::Text(self.to_vec())))
    }
}

impl ToProperty for [&str] {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        let text = self.iter().map(|s| s.to_string()).collect();
        obj.insert_property(name, Property::Array(Array::Text(text)))
    }
}

impl ToProperty for Vec<String> {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        self.as_slice().write_property(obj, name)
    }
}

impl ToProperty for Vec<&str> {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        self.as_slice().write_property(obj, name)
    }
}

impl FromProperty for Vec<String> {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        match obj.find_property(name) {
            None => Ok(None),
            Some(Property::Array(Array::Text(v))) => Ok(Some(v.clone())),
            Some(Property::Array(Array::Empty)) => Ok(Some(Vec::new())),
            Some(other) => Err(Error::mismatch(name, "null_term_string/array", other.describe())),
        }
    }
}

// ============================================================================
// Strings
// ============================================================================

impl ToProperty for str {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        write_text(obj, name, self)
    }
}

impl ToProperty for String {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        write_text(obj, name, self)
    }
}

impl FromProperty for String {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        read_text(obj, name)
    }
}

impl ToProperty for Box<str> {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        write_text(obj, name, self)
    }
}

impl FromProperty for Box<str> {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        Ok(read_text(obj, name)?.map(String::into_boxed_str))
    }
}

impl ToProperty for Cow<'_, str> {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        write_text(obj, name, self)
    }
}

impl FromProperty for Cow<'static, str> {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        Ok(read_text(obj, name)?.map(Cow::Owned))
    }
}

impl<const N: usize> ToProperty for SmallString<N> {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        write_text(obj, name, self.as_str())
    }
}

impl<const N: usize> FromProperty for SmallString<N> {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        Ok(read_text(obj, name)?.map(|s| SmallString::from(s.as_str())))
    }
}

impl ToProperty for Path {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        write_text(obj, name, path_text(self)?)
    }
}

impl ToProperty for PathBuf {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        self.as_path().write_property(obj, name)
    }
}

impl FromProperty for PathBuf {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        Ok(read_text(obj, name)?.map(PathBuf::from))
    }
}

impl ToProperty for CStr {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        write_text(obj, name, c_text(self)?)
    }
}

impl ToProperty for CString {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        self.as_c_str().write_property(obj, name)
    }
}

impl FromProperty for CString {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        match read_text(obj, name)? {
            None => Ok(None),
            Some(text) => CString::new(text)
                .map(Some)
                .map_err(|e| Error::invalid(format!("property '{}': {}", name, e))),
        }
    }
}

// ============================================================================
// Maps and pairs
// ============================================================================

fn write_entries<'e, K, V>(
    obj: &mut ArchiveObjectMut<'_>,
    name: &str,
    entries: impl Iterator<Item = (&'e K, &'e V)>,
) -> Result<()>
where
    K: ToProperty + 'e,
    V: ToProperty + 'e,
{
    let mut map = obj.create_child(name)?;
    for (i, (key, value)) in entries.enumerate() {
        key.write_property(&mut map, &index_name("k", i))?;
        value.write_property(&mut map, &index_name("v", i))?;
    }
    Ok(())
}

/// Entries `k0, v0, ...` up to the first missing index.
fn read_entries<K: FromProperty, V: FromProperty>(
    obj: &ArchiveObject<'_>,
    name: &str,
) -> Result<Option<Vec<(K, V)>>> {
    let Some(map) = obj.try_get_object(name)? else {
        return Ok(None);
    };
    let mut entries = Vec::with_capacity(map.len() / 2);
    loop {
        let i = entries.len();
        let key = K::read_property(&map, &index_name("k", i))?;
        let value = V::read_property(&map, &index_name("v", i))?;
        match (key, value) {
            (Some(key), Some(value)) => entries.push((key, value)),
            _ => break,
        }
    }
    Ok(Some(entries))
}

impl<K: ToProperty, V: ToProperty, S> ToProperty for HashMap<K, V, S> {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        write_entries(obj, name, self.iter())
    }
}

impl<K, V, S> FromProperty for HashMap<K, V, S>
where
    K: FromProperty + Eq + Hash,
    V: FromProperty,
    S: std::hash::BuildHasher + Default,
{
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        Ok(read_entries(obj, name)?.map(|entries| entries.into_iter().collect()))
    }
}

impl<K: ToProperty, V: ToProperty> ToProperty for BTreeMap<K, V> {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        write_entries(obj, name, self.iter())
    }
}

impl<K: FromProperty + Ord, V: FromProperty> FromProperty for BTreeMap<K, V> {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        Ok(read_entries(obj, name)?.map(|entries| entries.into_iter().collect()))
    }
}

impl<F: ToProperty, S: ToProperty> ToProperty for (F, S) {
    fn write_property(&self, obj: &mut ArchiveObjectMut<'_>, name: &str) -> Result<()> {
        let mut pair = obj.create_child(name)?;
        self.0.write_property(&mut pair, "f")?;
        self.1.write_property(&mut pair, "s")
    }
}

impl<F: FromProperty, S: FromProperty> FromProperty for (F, S) {
    fn read_property(obj: &ArchiveObject<'_>, name: &str) -> Result<Option<Self>> {
        let Some(pair) = obj.try_get_object(name)? else {
            return Ok(None);
        };
        Ok(F::read_property(&pair, "f")?.zip(S::read_property(&pair, "s")?))
    }
}
