//! Property values stored in an archive tree.
//!
//! A [`Property`] is a sum type whose payload type always matches its
//! [`PropertyType`] tag, so a tag can never disagree with the bytes it
//! describes. The tags are still available for the codecs through
//! [`Property::property_type`] and [`Property::container_type`].

use crate::util::{ContainerType, PropertyType};
use std::fmt;

/// Handle of a node inside an [`Archive`](super::Archive) arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    /// Position of the node in the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single fixed width value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    Float32(f32),
    Float64(f64),
    Character(u8),
    Boolean(bool),
}

impl Scalar {
    /// Type tag of the stored value.
    pub const fn property_type(&self) -> PropertyType {
        match self {
            Self::Int8(_) => PropertyType::Int8,
            Self::Int16(_) => PropertyType::Int16,
            Self::Int32(_) => PropertyType::Int32,
            Self::Int64(_) => PropertyType::Int64,
            Self::Int128(_) => PropertyType::Int128,
            Self::Float32(_) => PropertyType::Float32,
            Self::Float64(_) => PropertyType::Float64,
            Self::Character(_) => PropertyType::Character,
            Self::Boolean(_) => PropertyType::Boolean,
        }
    }
}

/// Homogeneous sequence of elements.
///
/// Unsigned values share the variant of the signed type with the same width.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Array {
    /// Zero elements of unknown type (an empty JSON array)
    #[default]
    Empty,
    Binary(Vec<u8>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int128(Vec<i128>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Character(Vec<u8>),
    Boolean(Vec<bool>),
    /// String elements
    Text(Vec<String>),
    /// Nested objects, one arena node per element
    Object(Vec<ObjectId>),
}

impl Array {
    /// Element type tag.
    pub const fn property_type(&self) -> PropertyType {
        match self {
            Self::Empty => PropertyType::Invalid,
            Self::Binary(_) => PropertyType::Binary,
            Self::Int8(_) => PropertyType::Int8,
            Self::Int16(_) => PropertyType::Int16,
            Self::Int32(_) => PropertyType::Int32,
            Self::Int64(_) => PropertyType::Int64,
            Self::Int128(_) => PropertyType::Int128,
            Self::Float32(_) => PropertyType::Float32,
            Self::Float64(_) => PropertyType::Float64,
            Self::Character(_) => PropertyType::Character,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::Text(_) => PropertyType::NullTermString,
            Self::Object(_) => PropertyType::Object,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Binary(v) => v.len(),
            Self::Int8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Int128(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Character(v) => v.len(),
            Self::Boolean(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Object(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `index` as a scalar, for numeric, character and boolean arrays.
    pub fn scalar_at(&self, index: usize) -> Option<Scalar> {
        match self {
            Self::Int8(v) => v.get(index).map(|x| Scalar::Int8(*x)),
            Self::Int16(v) => v.get(index).map(|x| Scalar::Int16(*x)),
            Self::Int32(v) => v.get(index).map(|x| Scalar::Int32(*x)),
            Self::Int64(v) => v.get(index).map(|x| Scalar::Int64(*x)),
            Self::Int128(v) => v.get(index).map(|x| Scalar::Int128(*x)),
            Self::Float32(v) => v.get(index).map(|x| Scalar::Float32(*x)),
            Self::Float64(v) => v.get(index).map(|x| Scalar::Float64(*x)),
            Self::Character(v) => v.get(index).map(|x| Scalar::Character(*x)),
            Self::Boolean(v) => v.get(index).map(|x| Scalar::Boolean(*x)),
            Self::Empty | Self::Binary(_) | Self::Text(_) | Self::Object(_) => None,
        }
    }

    /// Returns true if the array can back a `vecN` property.
    pub fn is_numeric(&self) -> bool {
        self.property_type().is_numeric()
    }
}

/// One named, typed value stored in an archive object.
#[derive(Clone, Debug, PartialEq)]
pub enum Property {
    /// Exactly one element
    Scalar(Scalar),
    /// Fixed numeric tuple of 1..=4 elements
    Vector(Array),
    /// Homogeneous sequence
    Array(Array),
    /// Byte run without terminator
    String(Vec<u8>),
    /// Text that is terminated on the wire
    NullTermString(String),
    /// Nested object
    Object(ObjectId),
}

impl Property {
    /// Build a `vecN` property, `None` if the arity is not 1..=4 or the
    /// elements are not numeric.
    pub fn vector(elements: Array) -> Option<Self> {
        (elements.is_numeric() && ContainerType::vector(elements.len()).is_some())
            .then_some(Self::Vector(elements))
    }

    /// Scalar kind tag.
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Scalar(s) => s.property_type(),
            Self::Vector(a) | Self::Array(a) => a.property_type(),
            Self::String(_) | Self::NullTermString(_) => PropertyType::Character,
            Self::Object(_) => PropertyType::Object,
        }
    }

    /// Container shape tag.
    pub fn container_type(&self) -> ContainerType {
        match self {
            Self::Scalar(_) => ContainerType::Scalar,
            Self::Vector(a) => ContainerType::vector(a.len()).unwrap_or(ContainerType::Array),
            Self::Array(_) => ContainerType::Array,
            Self::String(_) => ContainerType::String,
            Self::NullTermString(_) => ContainerType::NullTermString,
            Self::Object(_) => ContainerType::Object,
        }
    }

    /// Element count as it would be framed on the wire.
    ///
    /// Objects report 0 here; their entry count lives in the arena node.
    pub fn elements_number(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Vector(a) | Self::Array(a) => a.len(),
            Self::String(s) => s.len(),
            Self::NullTermString(s) => s.len() + 1,
            Self::Object(_) => 0,
        }
    }

    /// The nested object handle, if this is an object property.
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns true for `Object` properties.
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// String contents for either string container.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::NullTermString(s) => Some(s),
            Self::String(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Human readable `type/container` description used in errors and listings.
    pub fn describe(&self) -> String {
        format!("{}/{}", self.property_type(), self.container_type())
    }
}
