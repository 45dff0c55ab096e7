//! Utility types used throughout the crate.
//!
//! This module contains fundamental types:
//! - [`PropertyType`] / [`ContainerType`] - Type tags written on the wire
//! - [`Error`] / [`Result`] - Error handling
//! - [`SmallString`] - Inline-capacity string

mod types;
mod error;
mod small_string;

pub use types::*;
pub use error::*;
pub use small_string::*;
