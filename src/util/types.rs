//! Property type tags - the scalar kind and container shape of a property.
//!
//! Both enums are `#[repr(u8)]` and their discriminants are the bytes written
//! to the wire by the binary codec.

use std::fmt;

/// Scalar kind of a property: how its payload bytes are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PropertyType {
    /// Opaque bytes
    Binary = 0,
    /// 8-bit integer (signed or unsigned)
    Int8 = 1,
    /// 16-bit integer
    Int16 = 2,
    /// 32-bit integer
    Int32 = 3,
    /// 64-bit integer
    Int64 = 4,
    /// 128-bit integer
    Int128 = 5,
    /// IEEE 754 single precision
    Float32 = 6,
    /// IEEE 754 double precision
    Float64 = 7,
    /// Single byte character
    Character = 8,
    /// Nested archive object
    Object = 9,
    /// Boolean stored as one byte
    Boolean = 10,
    /// Null terminated string (used as an array element type)
    NullTermString = 11,
    /// Length prefixed string
    String = 12,
    /// Unknown/invalid type
    #[default]
    Invalid = 255,
}

impl PropertyType {
    /// Returns the size in bytes of one element of this type.
    ///
    /// Variable sized kinds (object, strings) and `Invalid` return 0.
    #[inline]
    pub const fn byte_width(self) -> usize {
        match self {
            Self::Binary => 1,
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 => 4,
            Self::Int64 => 8,
            Self::Int128 => 16,
            Self::Float32 => 4,
            Self::Float64 => 8,
            Self::Character => 1,
            Self::Boolean => 1,
            Self::Object => 0,
            Self::NullTermString => 0,
            Self::String => 0,
            Self::Invalid => 0,
        }
    }

    /// Returns the name of this type as a string.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Int128 => "int128",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Character => "character",
            Self::Object => "object",
            Self::Boolean => "boolean",
            Self::NullTermString => "null_term_string",
            Self::String => "string",
            Self::Invalid => "invalid",
        }
    }

    /// Convert from the wire byte.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Binary),
            1 => Some(Self::Int8),
            2 => Some(Self::Int16),
            3 => Some(Self::Int32),
            4 => Some(Self::Int64),
            5 => Some(Self::Int128),
            6 => Some(Self::Float32),
            7 => Some(Self::Float64),
            8 => Some(Self::Character),
            9 => Some(Self::Object),
            10 => Some(Self::Boolean),
            11 => Some(Self::NullTermString),
            12 => Some(Self::String),
            255 => Some(Self::Invalid),
            _ => None,
        }
    }

    /// Returns true for the fixed width numeric kinds.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Returns true if this is an integer type.
    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 | Self::Int128
        )
    }

    /// Returns true if this is a floating point type.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Maps an integer byte width to its property type.
///
/// Widths without an integer kind map to `Binary`.
pub const fn integer_type(width: usize) -> PropertyType {
    match width {
        1 => PropertyType::Int8,
        2 => PropertyType::Int16,
        4 => PropertyType::Int32,
        8 => PropertyType::Int64,
        16 => PropertyType::Int128,
        _ => PropertyType::Binary,
    }
}

/// Maps a floating point byte width to its property type.
pub const fn float_type(width: usize) -> PropertyType {
    match width {
        4 => PropertyType::Float32,
        8 => PropertyType::Float64,
        _ => PropertyType::Binary,
    }
}

/// Shape of a property: how many elements it holds and how that count is known.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ContainerType {
    /// Exactly one element
    #[default]
    Scalar = 0,
    /// N homogeneous elements, N stored explicitly
    Array = 1,
    /// Byte run, count = length
    String = 2,
    /// Byte run, count = length + 1 for the terminator
    NullTermString = 3,
    /// Fixed tuple of one element
    Vec1 = 4,
    /// Fixed tuple of two elements
    Vec2 = 5,
    /// Fixed tuple of three elements
    Vec3 = 6,
    /// Fixed tuple of four elements
    Vec4 = 7,
    /// Nested archive object
    Object = 8,
}

/// Arity of each fixed tuple container.
const VECTOR_ARITY: [(ContainerType, usize); 4] = [
    (ContainerType::Vec1, 1),
    (ContainerType::Vec2, 2),
    (ContainerType::Vec3, 3),
    (ContainerType::Vec4, 4),
];

impl ContainerType {
    /// Element count of a `vecN` container, `None` for every other shape.
    pub fn vector_arity(self) -> Option<usize> {
        VECTOR_ARITY
            .iter()
            .find(|(container, _)| *container == self)
            .map(|(_, arity)| *arity)
    }

    /// The `vecN` container holding `arity` elements.
    pub fn vector(arity: usize) -> Option<Self> {
        VECTOR_ARITY
            .iter()
            .find(|(_, n)| *n == arity)
            .map(|(container, _)| *container)
    }

    /// Returns true for `vec1..vec4`.
    #[inline]
    pub fn is_vector(self) -> bool {
        self.vector_arity().is_some()
    }

    /// Whether the element count is written on the wire.
    ///
    /// Scalars and vectors derive their count from the container tag.
    #[inline]
    pub fn has_count(self) -> bool {
        matches!(
            self,
            Self::Array | Self::String | Self::NullTermString | Self::Object
        )
    }

    /// Returns the name of this container as a string.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Array => "array",
            Self::String => "string",
            Self::NullTermString => "null_term_string",
            Self::Vec1 => "vec1",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Object => "object",
        }
    }

    /// Convert from the wire byte.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Scalar),
            1 => Some(Self::Array),
            2 => Some(Self::String),
            3 => Some(Self::NullTermString),
            4 => Some(Self::Vec1),
            5 => Some(Self::Vec2),
            6 => Some(Self::Vec3),
            7 => Some(Self::Vec4),
            8 => Some(Self::Object),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_widths() {
        assert_eq!(PropertyType::Int8.byte_width(), 1);
        assert_eq!(PropertyType::Int16.byte_width(), 2);
        assert_eq!(PropertyType::Int32.byte_width(), 4);
        assert_eq!(PropertyType::Int64.byte_width(), 8);
        assert_eq!(PropertyType::Int128.byte_width(), 16);
        assert_eq!(PropertyType::Float32.byte_width(), 4);
        assert_eq!(PropertyType::Float64.byte_width(), 8);
        assert_eq!(PropertyType::Character.byte_width(), 1);
        assert_eq!(PropertyType::Boolean.byte_width(), 1);
        assert_eq!(PropertyType::Object.byte_width(), 0);
        assert_eq!(PropertyType::Invalid.byte_width(), 0);
    }

    #[test]
    fn test_width_mapping() {
        assert_eq!(integer_type(std::mem::size_of::<u16>()), PropertyType::Int16);
        assert_eq!(integer_type(std::mem::size_of::<i128>()), PropertyType::Int128);
        assert_eq!(integer_type(3), PropertyType::Binary);
        assert_eq!(float_type(std::mem::size_of::<f64>()), PropertyType::Float64);
        assert_eq!(float_type(2), PropertyType::Binary);
    }

    #[test]
    fn test_wire_bytes() {
        assert_eq!(ContainerType::Object as u8, 8);
        assert_eq!(ContainerType::Vec1 as u8, 4);
        assert_eq!(PropertyType::Boolean as u8, 10);
        assert_eq!(PropertyType::Invalid as u8, 255);

        for byte in 0..=8u8 {
            let container = ContainerType::from_u8(byte).expect("valid container byte");
            assert_eq!(container as u8, byte);
        }
        assert_eq!(ContainerType::from_u8(9), None);
        assert_eq!(PropertyType::from_u8(13), None);
        assert_eq!(PropertyType::from_u8(255), Some(PropertyType::Invalid));
    }

    #[test]
    fn test_vector_arity_table() {
        assert_eq!(ContainerType::Vec1.vector_arity(), Some(1));
        assert_eq!(ContainerType::Vec4.vector_arity(), Some(4));
        assert_eq!(ContainerType::Array.vector_arity(), None);
        assert_eq!(ContainerType::vector(3), Some(ContainerType::Vec3));
        assert_eq!(ContainerType::vector(5), None);

        assert!(!ContainerType::Vec2.has_count());
        assert!(!ContainerType::Scalar.has_count());
        assert!(ContainerType::Object.has_count());
        assert!(ContainerType::NullTermString.has_count());
    }
}
