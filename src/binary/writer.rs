//! Binary record writer.

use std::io::Write;

use byteorder::WriteBytesExt;

use super::format::{self, fixed_payload_len, implied_count, BinaryParams};
use super::record::RawProperty;
use crate::util::{ContainerType, Error, PropertyType, Result};

/// Writes framed property records to any [`Write`] sink.
pub struct Serializer<W: Write> {
    writer: W,
    params: BinaryParams,
    pos: u64,
}

impl<W: Write> Serializer<W> {
    /// Create a serializer, writing the header if `params.encode_header`.
    pub fn new(writer: W, params: BinaryParams) -> Result<Self> {
        let mut ser = Self {
            writer,
            params,
            pos: 0,
        };
        if params.encode_header {
            ser.write_bytes(&params.header())?;
        }
        Ok(ser)
    }

    /// Layout options in use.
    #[inline]
    pub fn params(&self) -> BinaryParams {
        self.params
    }

    /// Number of bytes written so far, header included.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Write one record.
    ///
    /// Plain element runs are checked against the payload length; structured
    /// payloads are written as given.
    pub fn write_property(&mut self, raw: &RawProperty<'_>) -> Result<()> {
        let expected = fixed_payload_len(raw.property_type, raw.container_type, raw.elements_number);
        if let Some(expected) = expected {
            if expected != raw.payload.len() {
                return Err(Error::invalid(format!(
                    "{}/{} record with {} elements needs {} payload bytes, got {}",
                    raw.property_type,
                    raw.container_type,
                    raw.elements_number,
                    expected,
                    raw.payload.len()
                )));
            }
        }

        self.write_record_header(raw.container_type, raw.property_type, raw.elements_number)?;
        self.write_bytes(&raw.payload)
    }

    /// Write a sequence of records in order.
    ///
    /// Names are not part of a flat record stream; they are only traced.
    pub fn write_properties<'p, N, I>(&mut self, properties: I) -> Result<()>
    where
        N: AsRef<str>,
        I: IntoIterator<Item = (N, RawProperty<'p>)>,
    {
        for (name, raw) in properties {
            tracing::trace!(name = name.as_ref(), pos = self.pos, "write record");
            self.write_property(&raw)?;
        }
        Ok(())
    }

    /// Write the container byte, type byte and, where the container needs
    /// one, the count.
    pub(crate) fn write_record_header(
        &mut self,
        container_type: ContainerType,
        property_type: PropertyType,
        count: usize,
    ) -> Result<()> {
        if let Some(implied) = implied_count(container_type) {
            if implied != count {
                return Err(Error::invalid(format!(
                    "{} container holds {} elements, got {}",
                    container_type, implied, count
                )));
            }
        }

        self.writer.write_u8(container_type as u8)?;
        self.writer.write_u8(property_type as u8)?;
        self.pos += 2;
        if container_type.has_count() {
            self.write_count(count)?;
        }
        Ok(())
    }

    /// Write a bare count field.
    pub(crate) fn write_count(&mut self, count: usize) -> Result<()> {
        format::write_count(&mut self.writer, count, &self.params)?;
        self.pos += self.params.count_size() as u64;
        Ok(())
    }

    pub(crate) fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
