//! Core layer - the in-memory property tree.
//!
//! This module provides:
//! - [`Archive`] - Root of a tree, owning every node
//! - [`ArchiveObject`] / [`ArchiveObjectMut`] - Read and write views of one node
//! - [`Property`] / [`Scalar`] / [`Array`] - Typed values stored in a node
//! - [`ToProperty`] / [`FromProperty`] - Conversions from and to Rust types
//! - [`Archivable`] - Persistence contract for user types

mod archive;
mod convert;
mod element;
mod object;
mod property;
mod traits;

pub use archive::{Archive, UNSET_VERSION};
pub use convert::{FromProperty, ToProperty};
pub use element::Element;
pub use object::{ArchiveObject, ArchiveObjectMut, PropertyList};
pub use property::{Array, ObjectId, Property, Scalar};
pub use traits::Archivable;
