//! Compact binary wire format.
//!
//! ## Buffer Structure
//!
//! ```text
//! +------------------+
//! | Magic: "PS"      |  2 bytes   (optional header)
//! | Version          |  1 byte
//! | Flags            |  1 byte    bit0 large counts, bit7 header present
//! +------------------+
//! | container_type   |  1 byte    record, repeated
//! | property_type    |  1 byte
//! | count            |  u16/u64 LE, only for array/string/object shapes
//! | payload          |
//! +------------------+
//! ```
//!
//! [`Serializer`] and [`Deserializer`] work on flat record streams, either
//! record by record or as typed values through [`Serializable`] and
//! [`Deserializable`]. The `Archive` methods in this module frame whole
//! trees as `name value` record pairs.

mod format;
mod record;
mod writer;
mod reader;
mod codec;
mod tree;
mod stream;

pub use format::*;
pub use record::RawProperty;
pub use writer::Serializer;
pub use reader::Deserializer;
pub use codec::{decode_property, encode_property};
pub use stream::{Deserializable, Serializable};
