//! # proptree
//!
//! Self-describing property trees with a compact binary wire format and a
//! JSON bridge.
//!
//! An [`Archive`] owns a tree of named properties. Each property is a typed
//! scalar, a fixed-size vector, an array, a string, or a nested object. User
//! types persist themselves through [`Archivable`]; plain values go through
//! [`ToProperty`] and [`FromProperty`].
//!
//! ## Modules
//!
//! - [`util`] - Type tags, errors, small strings
//! - [`core`] - In-memory tree, typed access, conversions
//! - [`binary`] - Binary records and whole-tree encoding
//! - [`json`] - JSON import and export
//!
//! ## Example
//!
//! ```
//! use proptree::{Archive, BinaryParams};
//!
//! let mut archive = Archive::new();
//! let mut root = archive.root_mut();
//! root.set_property("count", &5i32)?;
//! root.child("camera")?.set_property("fov", &60.0f32)?;
//!
//! let bytes = archive.to_bytes(BinaryParams::default())?;
//! let decoded = Archive::from_bytes(&bytes)?;
//! assert_eq!(decoded.root().get::<i32>("count"), Some(5));
//! # Ok::<(), proptree::Error>(())
//! ```

pub mod util;
pub mod core;
pub mod binary;
pub mod json;

// Re-export commonly used types
pub use util::{ContainerType, Error, PropertyType, Result, SmallString};
pub use core::{
    Archivable, Archive, ArchiveObject, ArchiveObjectMut, Array, Element, FromProperty, ObjectId,
    Property, Scalar, ToProperty,
};
pub use binary::{
    has_header, BinaryParams, Deserializable, Deserializer, RawProperty, Serializable, Serializer,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::binary::{BinaryParams, Deserializable, Serializable};
    pub use crate::core::{
        Archivable, Archive, ArchiveObject, ArchiveObjectMut, FromProperty, Property, ToProperty,
    };
    pub use crate::util::{Error, Result};
}
