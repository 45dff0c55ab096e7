//! One framed wire record.

use std::borrow::Cow;
use std::fmt;

use crate::util::{ContainerType, PropertyType};

/// A property as it appears on the wire: tags, count and payload bytes.
///
/// Records produced by the [`Deserializer`](super::Deserializer) borrow the
/// input buffer; [`RawProperty::into_owned`] detaches them from it.
#[derive(Clone, PartialEq, Eq)]
pub struct RawProperty<'a> {
    pub property_type: PropertyType,
    pub container_type: ContainerType,
    /// Element count, implied or explicit
    pub elements_number: usize,
    /// Payload bytes exactly as framed
    pub payload: Cow<'a, [u8]>,
}

impl<'a> RawProperty<'a> {
    pub fn new(
        property_type: PropertyType,
        container_type: ContainerType,
        elements_number: usize,
        payload: impl Into<Cow<'a, [u8]>>,
    ) -> Self {
        Self {
            property_type,
            container_type,
            elements_number,
            payload: payload.into(),
        }
    }

    /// A null terminated string record.
    pub fn text(text: &str) -> RawProperty<'static> {
        let mut payload = Vec::with_capacity(text.len() + 1);
        payload.extend_from_slice(text.as_bytes());
        payload.push(0);
        RawProperty::new(
            PropertyType::Character,
            ContainerType::NullTermString,
            payload.len(),
            payload,
        )
    }

    /// Copy the payload so the record no longer borrows its source buffer.
    pub fn into_owned(self) -> RawProperty<'static> {
        RawProperty {
            property_type: self.property_type,
            container_type: self.container_type,
            elements_number: self.elements_number,
            payload: Cow::Owned(self.payload.into_owned()),
        }
    }

    /// True while the payload is a view into another buffer.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.payload, Cow::Borrowed(_))
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Contents of a string record without the terminator.
    pub fn as_str(&self) -> Option<&str> {
        let bytes = match self.container_type {
            ContainerType::NullTermString => {
                self.payload.strip_suffix(&[0u8]).unwrap_or(&self.payload[..])
            }
            ContainerType::String => &self.payload[..],
            _ => return None,
        };
        std::str::from_utf8(bytes).ok()
    }
}

impl fmt::Debug for RawProperty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawProperty")
            .field("type", &self.property_type)
            .field("container", &self.container_type)
            .field("count", &self.elements_number)
            .field("payload_len", &self.payload.len())
            .field("borrowed", &self.is_borrowed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_record() {
        let raw = RawProperty::text("name");
        assert_eq!(raw.elements_number, 5);
        assert_eq!(raw.payload(), b"name\0");
        assert_eq!(raw.as_str(), Some("name"));
        assert!(!raw.is_borrowed());
    }

    #[test]
    fn test_into_owned() {
        let buf = vec![1u8, 2, 3, 4];
        let raw = RawProperty::new(PropertyType::Int32, ContainerType::Scalar, 1, &buf[..]);
        assert!(raw.is_borrowed());

        let owned = raw.into_owned();
        drop(buf);
        assert!(!owned.is_borrowed());
        assert_eq!(owned.payload(), &[1, 2, 3, 4]);
        assert_eq!(owned.as_str(), None);
    }
}
