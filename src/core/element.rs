//! Numeric element types - the fixed width values a property can hold.

use bytemuck::Pod;

use super::property::{Array, Scalar};
use crate::util::PropertyType;

// === Element trait for type-safe conversions ===

/// Trait for primitive numbers that can be stored in scalars, vectors and arrays.
///
/// Unsigned types are stored in the signed variant of the same width, so
/// `u32` and `i32` share [`PropertyType::Int32`] and convert bit for bit.
pub trait Element: Pod + Default + 'static {
    /// The corresponding property type tag.
    const PROPERTY_TYPE: PropertyType;

    /// Size of this type in bytes.
    const SIZE: usize = std::mem::size_of::<Self>();

    fn into_scalar(self) -> Scalar;

    /// `None` if the scalar holds a different type.
    fn from_scalar(scalar: &Scalar) -> Option<Self>;

    fn into_array(values: Vec<Self>) -> Array;

    /// `None` if the array holds a different type. An untyped empty array
    /// converts to an empty vector.
    fn from_array(array: &Array) -> Option<Vec<Self>>;
}

macro_rules! impl_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            const PROPERTY_TYPE: PropertyType = PropertyType::$variant;

            #[inline]
            fn into_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }

            #[inline]
            fn from_scalar(scalar: &Scalar) -> Option<Self> {
                match scalar {
                    Scalar::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn into_array(values: Vec<Self>) -> Array {
                Array::$variant(values)
            }

            fn from_array(array: &Array) -> Option<Vec<Self>> {
                match array {
                    Array::$variant(v) => Some(v.clone()),
                    Array::Empty => Some(Vec::new()),
                    _ => None,
                }
            }
        }
    };
    ($t:ty as $signed:ty, $variant:ident) => {
        impl Element for $t {
            const PROPERTY_TYPE: PropertyType = PropertyType::$variant;

            #[inline]
            fn into_scalar(self) -> Scalar {
                Scalar::$variant(bytemuck::cast::<$t, $signed>(self))
            }

            #[inline]
            fn from_scalar(scalar: &Scalar) -> Option<Self> {
                match scalar {
                    Scalar::$variant(v) => Some(bytemuck::cast::<$signed, $t>(*v)),
                    _ => None,
                }
            }

            fn into_array(values: Vec<Self>) -> Array {
                Array::$variant(bytemuck::cast_slice::<$t, $signed>(&values).to_vec())
            }

            fn from_array(array: &Array) -> Option<Vec<Self>> {
                match array {
                    Array::$variant(v) => Some(bytemuck::cast_slice::<$signed, $t>(v).to_vec()),
                    Array::Empty => Some(Vec::new()),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(i8, Int8);
impl_element!(i16, Int16);
impl_element!(i32, Int32);
impl_element!(i64, Int64);
impl_element!(i128, Int128);
impl_element!(u8 as i8, Int8);
impl_element!(u16 as i16, Int16);
impl_element!(u32 as i32, Int32);
impl_element!(u64 as i64, Int64);
impl_element!(u128 as i128, Int128);
impl_element!(f32, Float32);
impl_element!(f64, Float64);
