//! Binary record reader.
//!
//! The [`Deserializer`] never copies payloads: every [`RawProperty`] it yields
//! borrows the input buffer.

use std::borrow::Cow;

use super::format::{
    self, fixed_payload_len, has_header, implied_count, parse_header, BinaryParams, HEADER_SIZE,
    MAX_NESTING_DEPTH,
};
use super::record::RawProperty;
use crate::util::{ContainerType, Error, PropertyType, Result};

/// Reads framed property records from a byte slice.
#[derive(Clone, Debug)]
pub struct Deserializer<'a> {
    buf: &'a [u8],
    pos: usize,
    params: BinaryParams,
    depth: usize,
    failed: bool,
}

impl<'a> Deserializer<'a> {
    /// Create a deserializer, detecting the header from the first bytes.
    ///
    /// A header is recognized by [`has_header`]: the magic plus the
    /// header-present flag. Such a buffer must then carry a valid header.
    pub fn new(buf: &'a [u8]) -> Result<Self> {
        if has_header(buf) {
            Self::with_params(buf, BinaryParams::default())
        } else {
            Self::with_params(buf, BinaryParams::HEADERLESS)
        }
    }

    /// Create a deserializer for a known layout.
    ///
    /// With `encode_header` the header is required and its flags override
    /// `params.large_element_size`.
    pub fn with_params(buf: &'a [u8], params: BinaryParams) -> Result<Self> {
        let (params, pos) = if params.encode_header {
            (parse_header(buf)?, HEADER_SIZE)
        } else {
            (params, 0)
        };
        tracing::debug!(
            len = buf.len(),
            header = params.encode_header,
            large = params.large_element_size,
            "open binary buffer"
        );
        Ok(Self {
            buf,
            pos,
            params,
            depth: 0,
            failed: false,
        })
    }

    /// A deserializer over a nested payload, sharing this one's layout.
    pub fn nested(&self, payload: &'a [u8]) -> Deserializer<'a> {
        Deserializer {
            buf: payload,
            pos: 0,
            params: BinaryParams {
                encode_header: false,
                ..self.params
            },
            depth: self.depth + 1,
            failed: false,
        }
    }

    /// Layout of the buffer.
    #[inline]
    pub fn params(&self) -> BinaryParams {
        self.params
    }

    /// Current read offset in the buffer.
    ///
    /// Not named `position`, which `Iterator` already provides.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes not read yet.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// True once every record has been read.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Read the next record, `None` at the end of the buffer.
    pub fn next_property(&mut self) -> Result<Option<RawProperty<'a>>> {
        if self.is_finished() {
            return Ok(None);
        }
        let start = self.pos;
        let (container_type, property_type, count) = self.read_record_header()?;
        let payload = self.read_payload(property_type, container_type, count)?;
        tracing::trace!(
            pos = start,
            %property_type,
            %container_type,
            count,
            "read record"
        );
        Ok(Some(RawProperty {
            property_type,
            container_type,
            elements_number: count,
            payload: Cow::Borrowed(payload),
        }))
    }

    /// Read every remaining record, naming them `"0"`, `"1"`, ...
    pub fn read_all(&mut self) -> Result<Vec<(String, RawProperty<'a>)>> {
        let mut out = Vec::new();
        while let Some(raw) = self.next_property()? {
            out.push((out.len().to_string(), raw));
        }
        Ok(out)
    }

    /// Read a container byte, a type byte and the count.
    pub(crate) fn read_record_header(&mut self) -> Result<(ContainerType, PropertyType, usize)> {
        let at = self.pos;
        let container_byte = self.read_u8()?;
        let type_byte = self.read_u8()?;

        let container_type = ContainerType::from_u8(container_byte).ok_or_else(|| {
            Error::invalid(format!("invalid container byte {} at {}", container_byte, at))
        })?;
        let property_type = PropertyType::from_u8(type_byte).ok_or_else(|| {
            Error::invalid(format!("invalid type byte {} at {}", type_byte, at + 1))
        })?;

        let count = match implied_count(container_type) {
            Some(count) => count,
            None => self.read_count()?,
        };
        Ok((container_type, property_type, count))
    }

    /// Read a bare count field.
    pub fn read_count(&mut self) -> Result<usize> {
        let size = self.params.count_size();
        let mut field = self.take(size)?;
        Ok(format::read_count(&mut field, &self.params)?)
    }

    /// Take the payload of a record whose header was just read.
    pub(crate) fn read_payload(
        &mut self,
        property_type: PropertyType,
        container_type: ContainerType,
        count: usize,
    ) -> Result<&'a [u8]> {
        let len = match fixed_payload_len(property_type, container_type, count) {
            Some(len) => len,
            None => {
                let buf = self.buf;
                let mut walker = self.nested(&buf[self.pos..]);
                walker.skip_structured(property_type, container_type, count)?;
                walker.pos
            }
        };
        self.take(len)
    }

    /// Walk a structured payload without decoding it.
    fn skip_structured(
        &mut self,
        property_type: PropertyType,
        container_type: ContainerType,
        count: usize,
    ) -> Result<()> {
        if self.depth > MAX_NESTING_DEPTH {
            return Err(Error::invalid(format!(
                "objects nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }

        match (container_type, property_type) {
            (ContainerType::Object, _) => self.skip_entries(count),
            (ContainerType::Array, PropertyType::Object) => {
                for _ in 0..count {
                    let entries = self.read_count()?;
                    self.skip_entries(entries)?;
                }
                Ok(())
            }
            (ContainerType::Array, PropertyType::NullTermString) => {
                for _ in 0..count {
                    let len = self.read_count()?;
                    self.take(len)?;
                }
                Ok(())
            }
            _ => Err(Error::invalid(format!(
                "{}/{} has no structured payload",
                property_type, container_type
            ))),
        }
    }

    /// Skip `count` name/value record pairs.
    fn skip_entries(&mut self, count: usize) -> Result<()> {
        for _ in 0..count.saturating_mul(2) {
            if self.next_property()?.is_none() {
                return Err(Error::UnexpectedEof(self.pos));
            }
        }
        Ok(())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let byte = self
            .buf
            .get(self.pos)
            .copied()
            .ok_or(Error::UnexpectedEof(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(Error::UnexpectedEof(self.buf.len()))?;
        let buf = self.buf;
        let bytes = &buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Enter one object level; fails past the nesting limit.
    pub(crate) fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(Error::invalid(format!(
                "objects nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl<'a> Iterator for Deserializer<'a> {
    type Item = Result<RawProperty<'a>>;

    /// Stops after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_property() {
            Ok(Some(raw)) => Some(Ok(raw)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
