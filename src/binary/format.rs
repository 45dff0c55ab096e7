//! Binary wire format constants and header handling.
//!
//! Layout (all multi-byte values little-endian):
//!
//! ```text
//! [optional header]  'P' 'S' version flags
//! record*            container_type property_type [count] payload
//! ```
//!
//! The count is present only for containers whose element count is not
//! implied by the container tag, see [`ContainerType::has_count`].

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::util::{ContainerType, Error, PropertyType, Result};

/// Magic bytes at the start of a buffer with a header.
pub const MAGIC: &[u8; 2] = b"PS";

/// Size of the header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Offset of the format version in the header.
pub const VERSION_OFFSET: usize = 2;

/// Offset of the flags byte in the header.
pub const FLAGS_OFFSET: usize = 3;

/// Current wire format version.
pub const CURRENT_VERSION: u8 = 1;

/// Counts are written as u64 instead of u16.
pub const FLAG_LARGE_ELEMENT_SIZE: u8 = 1 << 0;

/// Always set in a written header.
///
/// A headerless buffer starts with a container byte (0..=8), so a buffer
/// carrying both the magic and this bit cannot be mistaken for records.
pub const FLAG_HEADER_PRESENT: u8 = 1 << 7;

/// Largest count that fits the small count field.
pub const MAX_SMALL_COUNT: usize = u16::MAX as usize;

/// Deepest object nesting accepted by the codecs.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Layout options for the binary codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BinaryParams {
    /// Write the 4-byte header in front of the records
    pub encode_header: bool,
    /// Use u64 counts instead of u16
    pub large_element_size: bool,
}

impl Default for BinaryParams {
    fn default() -> Self {
        Self {
            encode_header: true,
            large_element_size: false,
        }
    }
}

impl BinaryParams {
    /// Params of a buffer with no header and small counts.
    pub const HEADERLESS: Self = Self {
        encode_header: false,
        large_element_size: false,
    };

    /// Size in bytes of a count field.
    #[inline]
    pub const fn count_size(&self) -> usize {
        if self.large_element_size {
            8
        } else {
            2
        }
    }

    /// Flags byte as written in the header.
    pub const fn flags(&self) -> u8 {
        let mut flags = FLAG_HEADER_PRESENT;
        if self.large_element_size {
            flags |= FLAG_LARGE_ELEMENT_SIZE;
        }
        flags
    }

    /// The 4 header bytes for these params.
    pub const fn header(&self) -> [u8; HEADER_SIZE] {
        [MAGIC[0], MAGIC[1], CURRENT_VERSION, self.flags()]
    }
}

/// Check whether `buf` starts with a header.
///
/// True only when the buffer holds the magic and the header-present flag.
pub fn has_header(buf: &[u8]) -> bool {
    buf.len() >= HEADER_SIZE
        && &buf[..MAGIC.len()] == MAGIC
        && buf[FLAGS_OFFSET] & FLAG_HEADER_PRESENT != 0
}

/// Parse and validate a header at the start of `buf`.
pub fn parse_header(buf: &[u8]) -> Result<BinaryParams> {
    if buf.len() < HEADER_SIZE {
        return Err(Error::UnexpectedEof(buf.len()));
    }
    if &buf[..MAGIC.len()] != MAGIC {
        return Err(Error::InvalidMagic);
    }

    let flags = buf[FLAGS_OFFSET];
    if flags & FLAG_HEADER_PRESENT == 0 {
        return Err(Error::invalid("header flag bit 7 is not set"));
    }

    let version = buf[VERSION_OFFSET];
    if version != CURRENT_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(BinaryParams {
        encode_header: true,
        large_element_size: flags & FLAG_LARGE_ELEMENT_SIZE != 0,
    })
}

/// Payload size of a record whose layout is a plain element run.
///
/// `None` for structured payloads: objects, arrays of objects and arrays of
/// strings, which are measured by walking them.
pub fn fixed_payload_len(
    property_type: PropertyType,
    container_type: ContainerType,
    count: usize,
) -> Option<usize> {
    match (container_type, property_type) {
        (ContainerType::Object, _) => None,
        (ContainerType::Array, PropertyType::Object | PropertyType::NullTermString) => None,
        (ContainerType::String | ContainerType::NullTermString, _) => Some(count),
        _ => Some(count.saturating_mul(property_type.byte_width())),
    }
}

/// Element count implied by the container tag, if any.
pub fn implied_count(container_type: ContainerType) -> Option<usize> {
    match container_type {
        ContainerType::Scalar => Some(1),
        other => other.vector_arity(),
    }
}

/// Write a count field.
pub fn write_count<W: Write>(writer: &mut W, count: usize, params: &BinaryParams) -> Result<()> {
    if params.large_element_size {
        writer.write_u64::<LittleEndian>(count as u64)?;
    } else {
        let small = u16::try_from(count).map_err(|_| Error::CountOverflow {
            count,
            max: MAX_SMALL_COUNT,
        })?;
        writer.write_u16::<LittleEndian>(small)?;
    }
    Ok(())
}

/// Read a count field.
pub fn read_count<R: Read>(reader: &mut R, params: &BinaryParams) -> std::io::Result<usize> {
    if params.large_element_size {
        let count = reader.read_u64::<LittleEndian>()?;
        // Counts past the address space cannot describe real data.
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    } else {
        Ok(reader.read_u16::<LittleEndian>()? as usize)
    }
}
